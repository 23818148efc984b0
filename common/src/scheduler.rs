use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::error::{MrError, Result};
use crate::job::{JobInfo, JobStatus};
use crate::table::{Dispatch, TaskTable};
use crate::task::{Assignment, Phase, TaskId};

/// Máquina de estados de planificación del coordinator.
///
/// Es dueña de las dos tablas de tareas. Cada método es una decisión completa
/// (leer, decidir, mutar); el llamador la envuelve en un único lock.
#[derive(Debug)]
pub struct Scheduler {
    input_files: Vec<String>,
    n_reduce: u32,
    map_tasks: TaskTable,
    reduce_tasks: TaskTable,
    config: SchedulerConfig,

    status: JobStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Scheduler {
    pub fn new(input_files: Vec<String>, n_reduce: u32, config: SchedulerConfig) -> Result<Self> {
        if n_reduce == 0 {
            return Err(MrError::InvalidJob("n_reduce debe ser >= 1".to_string()));
        }
        let n_map = u32::try_from(input_files.len())
            .map_err(|_| MrError::InvalidJob("demasiados archivos de entrada".to_string()))?;

        let mut scheduler = Self {
            map_tasks: TaskTable::new(Phase::Map, n_map),
            reduce_tasks: TaskTable::new(Phase::Reduce, n_reduce),
            input_files,
            n_reduce,
            config,
            status: JobStatus::Mapping,
            started_at: Utc::now(),
            finished_at: None,
        };
        // sin archivos de entrada la fase map ya está cumplida
        scheduler.status = scheduler.compute_status();
        info!(
            "job creado: {} tareas map, {} tareas reduce (stale_after={:?})",
            n_map, n_reduce, config.stale_after
        );
        Ok(scheduler)
    }

    pub fn n_map(&self) -> u32 {
        self.map_tasks.len()
    }

    pub fn n_reduce(&self) -> u32 {
        self.n_reduce
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn table(&self, phase: Phase) -> &TaskTable {
        match phase {
            Phase::Map => &self.map_tasks,
            Phase::Reduce => &self.reduce_tasks,
        }
    }

    fn table_mut(&mut self, phase: Phase) -> &mut TaskTable {
        match phase {
            Phase::Map => &mut self.map_tasks,
            Phase::Reduce => &mut self.reduce_tasks,
        }
    }

    /// RequestTask: decide qué le toca al worker que pregunta.
    ///
    /// Las tareas reduce no se despachan hasta que todas las map estén completas.
    pub fn request_task(&mut self, now: Instant) -> Assignment {
        let stale_after = self.config.stale_after;

        if let Some(d) = self.map_tasks.dispatch_next(now, stale_after) {
            log_dispatch(Phase::Map, d);
            return Assignment::Map {
                index: d.index,
                file_name: self.input_files[d.index as usize].clone(),
                n_reduce: self.n_reduce,
            };
        }
        if !self.map_tasks.all_completed() {
            return Assignment::Wait;
        }

        if let Some(d) = self.reduce_tasks.dispatch_next(now, stale_after) {
            log_dispatch(Phase::Reduce, d);
            return Assignment::Reduce {
                index: d.index,
                n_reduce: self.n_reduce,
            };
        }
        if !self.reduce_tasks.all_completed() {
            return Assignment::Wait;
        }

        Assignment::Exit
    }

    /// ReportDone: marca la tarea como completada sin importar qué intento la
    /// reporta. Devuelve true si es la primera vez.
    pub fn report_done(&mut self, phase: Phase, index: u32) -> Result<bool> {
        let first = match self.table_mut(phase).mark_completed(index) {
            Ok(first) => first,
            Err(e) => {
                warn!("reporte rechazado: {}", e);
                return Err(e);
            }
        };

        let id = TaskId { phase, index };
        if first {
            info!("tarea {} completada", id);
        } else {
            debug!("tarea {} ya estaba completada (reporte duplicado)", id);
        }

        let status = self.compute_status();
        if status != self.status {
            info!("job pasa de {:?} a {:?}", self.status, status);
            self.status = status;
            if status == JobStatus::Done {
                self.finished_at = Some(Utc::now());
            }
        }
        Ok(first)
    }

    /// IsJobDone: se calcula con los flags `completed`, nunca con cuántas
    /// tareas se despacharon.
    pub fn is_job_done(&self) -> bool {
        self.map_tasks.all_completed() && self.reduce_tasks.all_completed()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    fn compute_status(&self) -> JobStatus {
        if !self.map_tasks.all_completed() {
            JobStatus::Mapping
        } else if !self.reduce_tasks.all_completed() {
            JobStatus::Reducing
        } else {
            JobStatus::Done
        }
    }

    /// Tareas vencidas en este instante (candidatas a re-despacho).
    pub fn stragglers(&self, now: Instant) -> Vec<TaskId> {
        let stale_after = self.config.stale_after;
        let maps = self
            .map_tasks
            .stale_indices(now, stale_after)
            .into_iter()
            .map(|index| TaskId {
                phase: Phase::Map,
                index,
            });
        let reduces = self
            .reduce_tasks
            .stale_indices(now, stale_after)
            .into_iter()
            .map(|index| TaskId {
                phase: Phase::Reduce,
                index,
            });
        maps.chain(reduces).collect()
    }

    pub fn snapshot(&self, now: Instant) -> JobInfo {
        let stale_after = self.config.stale_after;
        JobInfo {
            status: self.status,
            n_map: self.map_tasks.len(),
            n_reduce: self.n_reduce,
            map_completed: self.map_tasks.completed_count(),
            reduce_completed: self.reduce_tasks.completed_count(),
            map_in_flight: self.map_tasks.in_flight_count(now, stale_after),
            reduce_in_flight: self.reduce_tasks.in_flight_count(now, stale_after),
            redispatches: self.map_tasks.redispatches() + self.reduce_tasks.redispatches(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

fn log_dispatch(phase: Phase, d: Dispatch) {
    let id = TaskId {
        phase,
        index: d.index,
    };
    if d.attempt > 1 {
        warn!("re-despachando tarea vencida {} (intento {})", id, d.attempt);
    } else {
        info!("despachando tarea {}", id);
    }
}
