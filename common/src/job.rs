use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estado global del job. Sólo avanza: MAPPING -> REDUCING -> DONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Mapping,
    Reducing,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub status: JobStatus,

    pub n_map: u32,
    pub n_reduce: u32,

    /// -------- Métricas del job --------
    pub map_completed: u32,
    pub reduce_completed: u32,
    /// Despachadas, sin completar y todavía dentro de la ventana de staleness
    pub map_in_flight: u32,
    pub reduce_in_flight: u32,
    /// Re-despachos de tareas vencidas (stragglers)
    pub redispatches: u32,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobInfo {
    pub fn total_tasks(&self) -> u32 {
        self.n_map + self.n_reduce
    }

    pub fn completed_tasks(&self) -> u32 {
        self.map_completed + self.reduce_completed
    }
}
