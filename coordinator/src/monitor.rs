use crate::state::AppState;
use common::TaskId;
use std::{
    collections::HashSet,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

/// Loop de seguimiento del job:
/// - avisa de tareas que vencieron sin reporte (quedan elegibles para re-despacho)
/// - termina cuando todas las tareas map y reduce están completadas
///
/// No re-encola nada: el re-despacho lo decide el scheduler cuando un worker pide.
pub async fn wait_for_completion(state: AppState, interval: Duration) {
    let mut reported: HashSet<TaskId> = HashSet::new();
    loop {
        tokio::time::sleep(interval).await;

        if sweep_once(&state, &mut reported) {
            info!("job completo: todas las tareas map y reduce terminaron");
            return;
        }
    }
}

/// Una pasada de chequeo. Devuelve true si el job terminó.
fn sweep_once(state: &AppState, reported: &mut HashSet<TaskId>) -> bool {
    let now = Instant::now();
    let scheduler = state.lock();

    let stale = scheduler.stragglers(now);
    for id in &stale {
        if reported.insert(*id) {
            warn!(
                "tarea {} sin reporte hace más de {:?}, elegible para re-despacho",
                id,
                scheduler.config().stale_after
            );
        }
    }
    // si se re-despachó, deja de estar vencida; si vuelve a vencer se avisa otra vez
    reported.retain(|id| stale.contains(id));

    let info = scheduler.snapshot(now);
    debug!(
        "progreso {:?}: map {}/{}, reduce {}/{}, en vuelo {}, re-despachos {}",
        info.status,
        info.map_completed,
        info.n_map,
        info.reduce_completed,
        info.n_reduce,
        info.map_in_flight + info.reduce_in_flight,
        info.redispatches
    );

    scheduler.is_job_done()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Phase, Scheduler, SchedulerConfig};

    fn state(stale_after: Duration) -> AppState {
        let scheduler =
            Scheduler::new(vec!["a.txt".to_string()], 1, SchedulerConfig { stale_after }).unwrap();
        AppState::new(scheduler)
    }

    #[test]
    fn sweep_avisa_una_vez_por_tarea_vencida() {
        let state = state(Duration::ZERO);
        state.lock().request_task(Instant::now());

        let mut reported = HashSet::new();
        assert!(!sweep_once(&state, &mut reported));
        assert_eq!(reported.len(), 1);
        assert!(!sweep_once(&state, &mut reported));
        assert_eq!(reported.len(), 1);

        state.lock().report_done(Phase::Map, 0).unwrap();
        assert!(!sweep_once(&state, &mut reported));
        assert!(reported.is_empty());
    }

    #[tokio::test]
    async fn wait_for_completion_termina_cuando_el_job_termina() {
        let state = state(Duration::from_secs(10));
        {
            let mut s = state.lock();
            s.report_done(Phase::Map, 0).unwrap();
            s.report_done(Phase::Reduce, 0).unwrap();
        }

        tokio::time::timeout(
            Duration::from_secs(2),
            wait_for_completion(state, Duration::from_millis(10)),
        )
        .await
        .unwrap();
    }
}
