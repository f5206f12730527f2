use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use uuid::Uuid;

use crate::api::rest::workers::WorkerRequest;
use crate::error::AppError;
use crate::models::job::ActiveJob;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/offers/:offer_id/accept", post(accept_offer))
        .route("/offers/:offer_id/reject", post(reject_offer))
}

async fn accept_offer(
    State(state): State<Arc<AppState>>,
    Path(offer_id): Path<Uuid>,
    Json(payload): Json<WorkerRequest>,
) -> Result<Json<ActiveJob>, AppError> {
    let job = state.session(payload.worker_id)?.accept_offer(offer_id)?;
    Ok(Json(job))
}

async fn reject_offer(
    State(state): State<Arc<AppState>>,
    Path(offer_id): Path<Uuid>,
    Json(payload): Json<WorkerRequest>,
) -> Result<StatusCode, AppError> {
    state.session(payload.worker_id)?.reject_offer(offer_id)?;
    Ok(StatusCode::NO_CONTENT)
}
