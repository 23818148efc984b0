use anyhow::Result;
use clap::Parser;
use common::{apps, config};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker::{HttpTaskSource, Shutdown, WorkerConfig};

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Worker MapReduce: pide tareas al coordinator hasta que no quede trabajo")]
struct Args {
    /// Aplicación a ejecutar (wordcount, indexer)
    #[arg(long, default_value = "wordcount")]
    app: String,

    /// Directorio compartido de intermedios y salidas (por defecto MR_WORK_DIR o ".")
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// URL del coordinator (por defecto COORDINATOR_URL)
    #[arg(long)]
    coordinator: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,common=info,reqwest=info")),
        )
        .init();

    let args = Args::parse();
    let app = apps::lookup(&args.app)?;

    let mut cfg = WorkerConfig::from_env();
    if let Some(dir) = args.work_dir {
        cfg.work_dir = dir;
    }
    let base_url = args.coordinator.unwrap_or_else(config::coordinator_url);

    // Nombre de host + pid (solo para logs del coordinator)
    let hostname_str = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let worker_id = format!("{}-{}", hostname_str, std::process::id());

    let source = HttpTaskSource::new(&base_url, worker_id)?;
    info!(
        "worker {} arrancando (app={}, coordinator={}, work_dir={})",
        source.worker_id(),
        app.name,
        base_url,
        cfg.work_dir.display()
    );

    match worker::run(&source, &app, &cfg).await? {
        Shutdown::Exit => info!("job terminado, worker sale"),
        Shutdown::CoordinatorGone => info!("coordinator no disponible, worker sale"),
    }
    Ok(())
}
