use serde::{Deserialize, Serialize};

use crate::task::{Assignment, Phase};

pub type WorkerId = String;

/// RequestTask. `worker_id` sólo se usa para logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentRequest {
    pub worker_id: WorkerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentResponse {
    pub task: Assignment,
}

/// ReportDone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteRequest {
    pub worker_id: WorkerId,
    pub phase: Phase,
    pub index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteResponse {
    pub ok: bool,
    /// false si otro intento ya la había reportado
    pub newly_completed: bool,
}

/// IsJobDone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDoneResponse {
    pub done: bool,
}
