use anyhow::{Context, Result};
use async_trait::async_trait;
use common::{config, engine, Assignment, MapReduceApp, Phase};
use std::{path::PathBuf, time::Duration};
use tokio::time::sleep;
use tracing::{info, warn};

/// Lo que el worker necesita del coordinator: pedir tarea y reportar fin.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn request_task(&self) -> Result<Assignment>;
    async fn report_done(&self, phase: Phase, index: u32) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directorio compartido de intermedios y salidas
    pub work_dir: PathBuf,
    /// Pausa tras un WAIT y entre tareas
    pub poll_interval: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            work_dir: config::work_dir(),
            poll_interval: config::poll_interval(),
        }
    }
}

/// Por qué terminó el loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// El coordinator contestó EXIT
    Exit,
    /// No se pudo hablar con el coordinator: se asume que el job terminó
    CoordinatorGone,
}

/// Loop principal del worker.
/// - Pide una tarea.
/// - Ejecuta map o reduce (en un hilo de bloqueo) y reporta.
/// - Ante WAIT duerme y vuelve a preguntar; ante EXIT termina.
///
/// Un error de I/O ejecutando la tarea es fatal y se devuelve como Err: no se
/// reporta nada y la tarea vence sola en el coordinator.
pub async fn run<S>(source: &S, app: &MapReduceApp, cfg: &WorkerConfig) -> Result<Shutdown>
where
    S: TaskSource + ?Sized,
{
    loop {
        let task = match source.request_task().await {
            Ok(task) => task,
            Err(e) => {
                warn!("no se pudo contactar al coordinator ({:#}), terminando", e);
                return Ok(Shutdown::CoordinatorGone);
            }
        };

        match task {
            Assignment::Map {
                index,
                file_name,
                n_reduce,
            } => {
                info!("tengo map {} (input={}, n_reduce={})", index, file_name, n_reduce);

                let app_cloned = app.clone();
                let dir = cfg.work_dir.clone();
                let input = file_name.clone();
                let records = tokio::task::spawn_blocking(move || {
                    engine::run_map(&app_cloned, index, &input, n_reduce, &dir)
                })
                .await
                .context("panic o join error en la tarea map")?
                .with_context(|| format!("map {} sobre {} falló", index, file_name))?;

                info!("terminé map {} ({} registros), reportando...", index, records);
                report(source, Phase::Map, index).await;
            }
            Assignment::Reduce { index, .. } => {
                info!("tengo reduce {}", index);

                let app_cloned = app.clone();
                let dir = cfg.work_dir.clone();
                let output = tokio::task::spawn_blocking(move || {
                    engine::run_reduce(&app_cloned, index, &dir)
                })
                .await
                .context("panic o join error en la tarea reduce")?
                .with_context(|| format!("reduce {} falló", index))?;

                info!("terminé reduce {} -> {}, reportando...", index, output.display());
                report(source, Phase::Reduce, index).await;
            }
            Assignment::Wait => {
                sleep(cfg.poll_interval).await;
                continue;
            }
            Assignment::Exit => {
                info!("el coordinator indica que no queda trabajo, saliendo");
                return Ok(Shutdown::Exit);
            }
        }

        sleep(cfg.poll_interval).await;
    }
}

// Si el reporte se pierde la tarea simplemente vence y se re-despacha
async fn report<S>(source: &S, phase: Phase, index: u32)
where
    S: TaskSource + ?Sized,
{
    if let Err(e) = source.report_done(phase, index).await {
        warn!("no se pudo reportar {:?} {}: {:#}", phase, index, e);
    }
}
