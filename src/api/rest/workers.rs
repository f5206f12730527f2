use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::session::SessionView;
use crate::error::AppError;
use crate::models::earnings::EarningsSummary;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/workers", post(register_worker).get(list_workers))
        .route("/workers/:worker_id/earnings", get(worker_earnings))
        .route("/online", post(go_online))
        .route("/offline", post(go_offline))
        .route("/session/:worker_id", get(session_state))
}

#[derive(Deserialize)]
pub struct RegisterWorkerRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct WorkerRequest {
    pub worker_id: Uuid,
}

async fn register_worker(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterWorkerRequest>,
) -> Result<Json<SessionView>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let session = state.register_worker(name.to_string());
    Ok(Json(session.current_state()))
}

async fn list_workers(State(state): State<Arc<AppState>>) -> Json<Vec<SessionView>> {
    let workers = state
        .sessions
        .iter()
        .map(|entry| entry.value().current_state())
        .collect();
    Json(workers)
}

async fn go_online(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WorkerRequest>,
) -> Result<StatusCode, AppError> {
    state.session(payload.worker_id)?.go_online()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn go_offline(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WorkerRequest>,
) -> Result<StatusCode, AppError> {
    state.session(payload.worker_id)?.go_offline()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn session_state(
    State(state): State<Arc<AppState>>,
    Path(worker_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.session(worker_id)?.current_state()))
}

async fn worker_earnings(
    State(state): State<Arc<AppState>>,
    Path(worker_id): Path<Uuid>,
) -> Result<Json<EarningsSummary>, AppError> {
    Ok(Json(state.session(worker_id)?.earnings()))
}
