use anyhow::{Context, Result};
use clap::Parser;
use common::{config, Scheduler, SchedulerConfig};
use coordinator::AppState;
use glob::glob;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coordinator")]
#[command(about = "Coordinator MapReduce: reparte tareas map y reduce a los workers")]
struct Args {
    /// Cantidad de tareas reduce (particiones)
    #[arg(short = 'r', long, default_value_t = 10)]
    n_reduce: u32,

    /// Dirección donde escuchar
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Archivos de entrada (se aceptan patrones glob), una tarea map por archivo
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<String>,
}

/// Expande los patrones glob manteniendo el orden de los argumentos.
/// Un argumento sin comodines se pasa tal cual.
fn expand_inputs(patterns: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            files.push(pattern.clone());
            continue;
        }

        let before = files.len();
        for entry in glob(pattern).with_context(|| format!("patrón inválido: {pattern}"))? {
            let path = entry?;
            if path.is_file() {
                files.push(path.to_string_lossy().to_string());
            }
        }
        if files.len() == before {
            warn!("el patrón {} no encontró archivos", pattern);
        }
    }
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("coordinator=debug,common=info,tower_http=info")
            }),
        )
        .init();

    let args = Args::parse();
    let files = expand_inputs(&args.inputs)?;

    let scheduler = Scheduler::new(files, args.n_reduce, SchedulerConfig::from_env())?;
    let state = AppState::new(scheduler);

    let listener = TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", args.addr))?;
    info!("coordinator escuchando en {}", listener.local_addr()?);

    coordinator::serve(listener, state, config::poll_interval()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs, path::PathBuf};

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("coordinator_main_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    #[test]
    fn expand_inputs_respeta_orden_y_literales() {
        let tmp = temp_dir("expand");
        for name in ["b.txt", "a.txt", "c.log"] {
            fs::write(tmp.join(name), "x").unwrap();
        }
        let pattern = format!("{}/*.txt", tmp.display());

        let files = expand_inputs(&["literal.txt".to_string(), pattern]).unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files[0], "literal.txt");
        assert!(files[1].ends_with("a.txt"));
        assert!(files[2].ends_with("b.txt"));
    }
}
