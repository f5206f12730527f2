use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AppError {
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("offer {0} has expired")]
    OfferExpired(String),

    #[error("offer {0} was already resolved")]
    AlreadyResolved(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("no session for worker {0}")]
    NoActiveSession(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable tag so clients can tell expected conditions apart.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::PreconditionFailed(_) => "precondition_failed",
            AppError::OfferExpired(_) => "offer_expired",
            AppError::AlreadyResolved(_) => "already_resolved",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::NoActiveSession(_) => "no_active_session",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::PreconditionFailed(_)
            | AppError::AlreadyResolved(_)
            | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::OfferExpired(_) => StatusCode::GONE,
            AppError::NoActiveSession(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (self.status(), body).into_response()
    }
}
