use serde::{Deserialize, Serialize};

/// Fase a la que pertenece una tarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Map,
    Reduce,
}

/// Identidad de una tarea: (fase, índice denso en [0, count)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId {
    pub phase: Phase,
    pub index: u32,
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Phase::Map => write!(f, "map#{}", self.index),
            Phase::Reduce => write!(f, "reduce#{}", self.index),
        }
    }
}

/// Lo que el coordinator le contesta a un worker que pide trabajo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assignment {
    Map {
        index: u32,
        /// Archivo de entrada de esta tarea map
        file_name: String,
        n_reduce: u32,
    },
    Reduce {
        index: u32,
        n_reduce: u32,
    },
    /// Hay tareas en vuelo y ninguna vencida: reintentar en un rato
    Wait,
    /// No habrá más trabajo: el worker debe terminar
    Exit,
}
