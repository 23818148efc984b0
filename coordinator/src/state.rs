// coordinator/src/state.rs

use common::Scheduler;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Estado compartido de los handlers: un único lock alrededor del scheduler.
/// Cada pedido lo toma durante toda su decisión (leer, decidir, mutar).
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Mutex<Scheduler>>,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
        }
    }

    /// Toma el lock. Si otro handler entró en pánico con el lock tomado,
    /// la tabla sigue siendo consistente: cada mutación es una sola llamada.
    pub fn lock(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
