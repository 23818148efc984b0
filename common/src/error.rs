use thiserror::Error;

use crate::task::Phase;

pub type Result<T> = std::result::Result<T, MrError>;

#[derive(Error, Debug)]
pub enum MrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registro intermedio que no se pudo (de)serializar
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("tarea {phase:?} {index} fuera de rango (hay {count})")]
    TaskOutOfRange { phase: Phase, index: u32, count: u32 },

    #[error("job inválido: {0}")]
    InvalidJob(String),

    #[error("aplicación desconocida: {0}")]
    UnknownApp(String),
}
