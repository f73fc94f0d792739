//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use questlog_domain::QuestlogError;
use serde::Serialize;
use tracing::error;

/// JSON error body: `{ "code": "...", "message": "..." }`
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation", message)
    }
}

impl From<QuestlogError> for ApiError {
    fn from(err: QuestlogError) -> Self {
        let status = match &err {
            QuestlogError::Validation(_) => StatusCode::BAD_REQUEST,
            QuestlogError::NotFound(_) => StatusCode::NOT_FOUND,
            QuestlogError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(kind = err.label(), error = %err, "request failed");
        }
        Self::new(status, err.label(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<Json<T>, ApiError>;
