use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use common::{config, JobDoneResponse, JobInfo};
use reqwest::Client;
use std::{process::ExitCode, time::Duration};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI del lanzador: consulta al coordinator si el job terminó")]
struct Cli {
    /// URL del coordinator (por defecto COORDINATOR_URL)
    #[arg(long, global = true)]
    coordinator: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Muestra el estado del job (fase, progreso, re-despachos)
    Status {
        /// Salida en JSON
        #[arg(long)]
        json: bool,
    },
    /// Imprime si el job terminó; código de salida 0 si terminó, 1 si no
    Done,
    /// Espera hasta que el job termine
    Wait {
        /// Intervalo de consulta en milisegundos
        #[arg(long, default_value_t = config::DEFAULT_POLL_INTERVAL_MS)]
        interval_ms: u64,

        /// Máximo de segundos a esperar (sin límite si no se indica)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

async fn fetch_done(client: &Client, base_url: &str) -> Result<bool> {
    let url = format!("{}/api/v1/job/done", base_url);
    let resp: JobDoneResponse = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(resp.done)
}

fn print_job(job: &JobInfo) {
    println!("Job:");
    println!("  estado: {:?}", job.status);
    println!(
        "  map   : {}/{} completadas, {} en vuelo",
        job.map_completed, job.n_map, job.map_in_flight
    );
    println!(
        "  reduce: {}/{} completadas, {} en vuelo",
        job.reduce_completed, job.n_reduce, job.reduce_in_flight
    );
    println!("  re-despachos: {}", job.redispatches);

    // progreso calculado localmente
    if job.total_tasks() > 0 {
        let pct = (job.completed_tasks() as f64 / job.total_tasks() as f64) * 100.0;
        println!("  progreso: {:.1}%", pct);
    }

    println!("  iniciado: {}", job.started_at);
    if let Some(ref done) = job.finished_at {
        println!("  finalizado: {}", done);
    }
}

pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = cli.coordinator.unwrap_or_else(config::coordinator_url);
    let base_url = base_url.trim_end_matches('/');

    match cli.command {
        Commands::Status { json } => {
            let url = format!("{}/api/v1/job", base_url);
            let resp = client.get(&url).send().await?;
            if !resp.status().is_success() {
                bail!("el coordinator respondió {}", resp.status());
            }
            let job: JobInfo = resp.json().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                print_job(&job);
            }
        }

        Commands::Done => {
            let done = fetch_done(&client, base_url).await?;
            println!("{}", done);
            if !done {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Wait {
            interval_ms,
            timeout_secs,
        } => {
            let interval = Duration::from_millis(interval_ms);
            let deadline =
                timeout_secs.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));

            // un job con una tarea que falla siempre no termina nunca: por eso el timeout
            while !fetch_done(&client, base_url).await? {
                if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                    eprintln!("el job no terminó en {} s", timeout_secs.unwrap_or_default());
                    return Ok(ExitCode::FAILURE);
                }
                tokio::time::sleep(interval).await;
            }
            println!("job terminado");
        }
    }

    Ok(ExitCode::SUCCESS)
}
