use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{
    Assignment, JobDoneResponse, JobInfo, TaskAssignmentRequest, TaskAssignmentResponse,
    TaskCompleteRequest, TaskCompleteResponse, TaskId,
};
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks/next", post(assign_task))
        .route("/api/v1/tasks/complete", post(complete_task))
        .route("/api/v1/job", get(get_job))
        .route("/api/v1/job/done", get(job_done))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// RequestTask: toda la decisión ocurre con el lock tomado
async fn assign_task(
    State(state): State<AppState>,
    Json(req): Json<TaskAssignmentRequest>,
) -> Json<TaskAssignmentResponse> {
    let task = state.lock().request_task(Instant::now());

    match &task {
        Assignment::Map {
            index, file_name, ..
        } => info!(
            "asignando map {} (input={}) al worker {}",
            index, file_name, req.worker_id
        ),
        Assignment::Reduce { index, .. } => {
            info!("asignando reduce {} al worker {}", index, req.worker_id)
        }
        Assignment::Wait => debug!("worker {} pidió tarea: esperar", req.worker_id),
        Assignment::Exit => debug!("worker {} pidió tarea: no queda trabajo", req.worker_id),
    }

    Json(TaskAssignmentResponse { task })
}

// ReportDone: se acepta aunque venga de un intento ya superado
async fn complete_task(
    State(state): State<AppState>,
    Json(req): Json<TaskCompleteRequest>,
) -> Result<Json<TaskCompleteResponse>, StatusCode> {
    let id = TaskId {
        phase: req.phase,
        index: req.index,
    };

    let result = state.lock().report_done(req.phase, req.index);
    match result {
        Ok(newly_completed) => {
            debug!(
                "worker {} reportó {} (nueva={})",
                req.worker_id, id, newly_completed
            );
            Ok(Json(TaskCompleteResponse {
                ok: true,
                newly_completed,
            }))
        }
        Err(e) => {
            warn!("reporte inválido de worker {}: {}", req.worker_id, e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}

// IsJobDone: lo consulta el lanzador, no los workers
async fn job_done(State(state): State<AppState>) -> Json<JobDoneResponse> {
    let done = state.lock().is_job_done();
    Json(JobDoneResponse { done })
}

async fn get_job(State(state): State<AppState>) -> Json<JobInfo> {
    Json(state.lock().snapshot(Instant::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use common::{Phase, Scheduler, SchedulerConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(n_map: usize, n_reduce: u32) -> (Router, AppState) {
        let files = (0..n_map).map(|i| format!("in-{i}.txt")).collect();
        let scheduler = Scheduler::new(files, n_reduce, SchedulerConfig::default()).unwrap();
        let state = AppState::new(scheduler);
        (build_router(state.clone()), state)
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_responde_ok() {
        let (router, _) = app(1, 1);
        let resp = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn next_devuelve_map_y_luego_wait() {
        let (router, _) = app(1, 2);
        let body = json!({ "worker_id": "w1" });

        let (status, v) = call(&router, "POST", "/api/v1/tasks/next", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["task"]["kind"], "MAP");
        assert_eq!(v["task"]["index"], 0);
        assert_eq!(v["task"]["file_name"], "in-0.txt");
        assert_eq!(v["task"]["n_reduce"], 2);

        let (_, v) = call(&router, "POST", "/api/v1/tasks/next", Some(body)).await;
        assert_eq!(v["task"]["kind"], "WAIT");
    }

    #[tokio::test]
    async fn complete_marca_la_tarea_y_avanza_el_job() {
        let (router, state) = app(1, 1);
        let next = json!({ "worker_id": "w1" });
        call(&router, "POST", "/api/v1/tasks/next", Some(next.clone())).await;

        let done = json!({ "worker_id": "w1", "phase": "MAP", "index": 0 });
        let (status, v) = call(&router, "POST", "/api/v1/tasks/complete", Some(done.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["newly_completed"], true);

        // duplicado: se acepta pero no es nuevo
        let (_, v) = call(&router, "POST", "/api/v1/tasks/complete", Some(done)).await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["newly_completed"], false);

        let (_, v) = call(&router, "POST", "/api/v1/tasks/next", Some(next)).await;
        assert_eq!(v["task"]["kind"], "REDUCE");
        assert!(state.lock().table(Phase::Map).all_completed());
    }

    #[tokio::test]
    async fn complete_fuera_de_rango_da_404_y_no_cambia_nada() {
        let (router, state) = app(2, 1);
        let done = json!({ "worker_id": "w1", "phase": "REDUCE", "index": 9 });

        let (status, _) = call(&router, "POST", "/api/v1/tasks/complete", Some(done)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.lock().table(Phase::Reduce).completed_count(), 0);
    }

    #[tokio::test]
    async fn complete_con_fase_invalida_se_rechaza() {
        let (router, _) = app(1, 1);
        let done = json!({ "worker_id": "w1", "phase": "WAIT", "index": 0 });

        let (status, _) = call(&router, "POST", "/api/v1/tasks/complete", Some(done)).await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn job_done_y_snapshot_siguen_las_completadas() {
        let (router, state) = app(1, 1);

        let (_, v) = call(&router, "GET", "/api/v1/job/done", None).await;
        assert_eq!(v["done"], false);

        {
            let mut s = state.lock();
            s.report_done(Phase::Map, 0).unwrap();
            s.report_done(Phase::Reduce, 0).unwrap();
        }

        let (_, v) = call(&router, "GET", "/api/v1/job/done", None).await;
        assert_eq!(v["done"], true);

        let (_, v) = call(&router, "GET", "/api/v1/job", None).await;
        assert_eq!(v["status"], "DONE");
        assert_eq!(v["map_completed"], 1);
        assert_eq!(v["reduce_completed"], 1);
        assert!(!v["finished_at"].is_null());
    }
}
