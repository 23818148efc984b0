use std::time::{Duration, Instant};

use crate::error::{MrError, Result};
use crate::task::Phase;

/// Estado de una tarea dentro de la tabla.
#[derive(Debug, Clone, Default)]
pub struct TaskState {
    pub completed: bool,
    pub last_dispatched_at: Option<Instant>,
    /// Cuántas veces se despachó (1 = sin re-despachos)
    pub attempts: u32,
}

impl TaskState {
    /// Despachada, sin completar y vencida respecto a `stale_after`.
    pub fn is_stale(&self, now: Instant, stale_after: Duration) -> bool {
        match (self.completed, self.last_dispatched_at) {
            (false, Some(at)) => now.saturating_duration_since(at) >= stale_after,
            _ => false,
        }
    }

    fn is_eligible(&self, now: Instant, stale_after: Duration) -> bool {
        !self.completed && (self.last_dispatched_at.is_none() || self.is_stale(now, stale_after))
    }
}

/// Tabla de tareas de una fase. Índices densos en [0, len), fijados al crearla.
///
/// No tiene control de concurrencia propio: el coordinator la muta bajo su lock.
#[derive(Debug, Clone)]
pub struct TaskTable {
    phase: Phase,
    tasks: Vec<TaskState>,
}

impl TaskTable {
    pub fn new(phase: Phase, count: u32) -> Self {
        Self {
            phase,
            tasks: vec![TaskState::default(); count as usize],
        }
    }

    pub fn len(&self) -> u32 {
        self.tasks.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&TaskState> {
        self.tasks.get(index as usize)
    }

    fn get_mut(&mut self, index: u32) -> Result<&mut TaskState> {
        let (phase, count) = (self.phase, self.len());
        self.tasks
            .get_mut(index as usize)
            .ok_or(MrError::TaskOutOfRange {
                phase,
                index,
                count,
            })
    }

    /// Registra un despacho. Devuelve el número de intento.
    pub fn mark_dispatched(&mut self, index: u32, now: Instant) -> Result<u32> {
        let task = self.get_mut(index)?;
        task.last_dispatched_at = Some(now);
        task.attempts += 1;
        Ok(task.attempts)
    }

    /// Marca la tarea como completada. Devuelve true sólo la primera vez.
    pub fn mark_completed(&mut self, index: u32) -> Result<bool> {
        let task = self.get_mut(index)?;
        let first = !task.completed;
        task.completed = true;
        Ok(first)
    }

    pub fn all_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.completed)
    }

    pub fn completed_count(&self) -> u32 {
        self.tasks.iter().filter(|t| t.completed).count() as u32
    }

    /// Tareas despachadas, sin completar y todavía dentro de la ventana.
    pub fn in_flight_count(&self, now: Instant, stale_after: Duration) -> u32 {
        self.tasks
            .iter()
            .filter(|t| {
                !t.completed && t.last_dispatched_at.is_some() && !t.is_stale(now, stale_after)
            })
            .count() as u32
    }

    /// Índices vencidos (stragglers) en este instante.
    pub fn stale_indices(&self, now: Instant, stale_after: Duration) -> Vec<u32> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_stale(now, stale_after))
            .map(|(i, _)| i as u32)
            .collect()
    }

    pub fn redispatches(&self) -> u32 {
        self.tasks.iter().map(|t| t.attempts.saturating_sub(1)).sum()
    }

    /// La tarea de menor índice sin completar que nunca se despachó
    /// o cuyo último despacho venció.
    pub fn next_candidate(&self, now: Instant, stale_after: Duration) -> Option<u32> {
        self.tasks
            .iter()
            .position(|t| t.is_eligible(now, stale_after))
            .map(|i| i as u32)
    }

    /// next_candidate + mark_dispatched en un solo paso.
    pub fn dispatch_next(&mut self, now: Instant, stale_after: Duration) -> Option<Dispatch> {
        let index = self.next_candidate(now, stale_after)?;
        // el candidato sale de la propia tabla: siempre está en rango
        let attempt = self.mark_dispatched(index, now).ok()?;
        Some(Dispatch { index, attempt })
    }
}

/// Resultado de despachar una tarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub index: u32,
    pub attempt: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALE: Duration = Duration::from_secs(10);

    #[test]
    fn next_candidate_devuelve_el_menor_indice_libre() {
        let now = Instant::now();
        let mut table = TaskTable::new(Phase::Map, 3);

        assert_eq!(table.next_candidate(now, STALE), Some(0));
        table.mark_dispatched(0, now).unwrap();
        assert_eq!(table.next_candidate(now, STALE), Some(1));
        table.mark_dispatched(1, now).unwrap();
        table.mark_dispatched(2, now).unwrap();
        assert_eq!(table.next_candidate(now, STALE), None);
    }

    #[test]
    fn tarea_vencida_es_elegible_a_los_diez_segundos_no_antes() {
        let t0 = Instant::now();
        let mut table = TaskTable::new(Phase::Map, 1);
        table.mark_dispatched(0, t0).unwrap();

        let casi = t0 + STALE - Duration::from_millis(1);
        assert_eq!(table.next_candidate(casi, STALE), None);
        assert_eq!(table.next_candidate(t0 + STALE, STALE), Some(0));
        assert_eq!(table.stale_indices(t0 + STALE, STALE), vec![0]);
    }

    #[test]
    fn completed_es_monotonico() {
        let now = Instant::now();
        let mut table = TaskTable::new(Phase::Reduce, 2);
        table.mark_dispatched(1, now).unwrap();

        assert!(table.mark_completed(1).unwrap());
        assert!(!table.mark_completed(1).unwrap());
        // re-despachar una completada no la "des-completa"
        table.mark_dispatched(1, now).unwrap();
        assert!(table.get(1).unwrap().completed);
        assert_eq!(table.completed_count(), 1);
        assert!(!table.all_completed());
    }

    #[test]
    fn completadas_nunca_son_candidatas_aunque_venzan() {
        let t0 = Instant::now();
        let mut table = TaskTable::new(Phase::Map, 1);
        table.mark_dispatched(0, t0).unwrap();
        table.mark_completed(0).unwrap();

        assert_eq!(table.next_candidate(t0 + STALE * 3, STALE), None);
        assert!(table.stale_indices(t0 + STALE * 3, STALE).is_empty());
    }

    #[test]
    fn indice_fuera_de_rango_se_rechaza() {
        let mut table = TaskTable::new(Phase::Reduce, 2);
        let err = table.mark_completed(2).unwrap_err();
        assert!(matches!(
            err,
            MrError::TaskOutOfRange {
                phase: Phase::Reduce,
                index: 2,
                count: 2
            }
        ));
        assert!(table.mark_dispatched(7, Instant::now()).is_err());
        assert_eq!(table.completed_count(), 0);
    }

    #[test]
    fn cuenta_en_vuelo_y_redespachos() {
        let t0 = Instant::now();
        let mut table = TaskTable::new(Phase::Map, 3);
        table.mark_dispatched(0, t0).unwrap();
        table.mark_dispatched(1, t0).unwrap();
        table.mark_dispatched(1, t0 + STALE).unwrap();

        assert_eq!(table.in_flight_count(t0 + STALE, STALE), 1);
        assert_eq!(table.get(1).unwrap().attempts, 2);
        assert_eq!(table.redispatches(), 1);
    }

    #[test]
    fn dispatch_next_redespacha_la_vencida() {
        let t0 = Instant::now();
        let mut table = TaskTable::new(Phase::Map, 2);

        assert_eq!(
            table.dispatch_next(t0, STALE),
            Some(Dispatch { index: 0, attempt: 1 })
        );
        assert_eq!(
            table.dispatch_next(t0, STALE),
            Some(Dispatch { index: 1, attempt: 1 })
        );
        assert_eq!(table.dispatch_next(t0, STALE), None);
        assert_eq!(
            table.dispatch_next(t0 + STALE, STALE),
            Some(Dispatch { index: 0, attempt: 2 })
        );
    }

    #[test]
    fn tabla_vacia_esta_completa() {
        let table = TaskTable::new(Phase::Map, 0);
        assert!(table.is_empty());
        assert!(table.all_completed());
        assert_eq!(table.next_candidate(Instant::now(), STALE), None);
    }
}
