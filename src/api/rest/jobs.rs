use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{patch, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::workers::WorkerRequest;
use crate::error::AppError;
use crate::models::job::ActiveJob;
use crate::models::offer::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/:job_id/advance", post(advance_job))
        .route("/jobs/:job_id/location", patch(update_location))
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub worker_id: Uuid,
    pub location: GeoPoint,
}

async fn advance_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<WorkerRequest>,
) -> Result<Json<ActiveJob>, AppError> {
    let job = state.session(payload.worker_id)?.advance_job(job_id)?;
    Ok(Json(job))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<ActiveJob>, AppError> {
    let job = state
        .session(payload.worker_id)?
        .update_position(job_id, payload.location)?;
    Ok(Json(job))
}
