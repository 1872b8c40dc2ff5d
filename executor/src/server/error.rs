use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::client::queue::QueueError;
use crate::service::ExecutionServiceError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Errors returned by the route handlers.
///
/// # Status Code Mapping
/// * `BadRequest` -> 400 Bad Request
/// * `NotFound` -> 404 Not Found
/// * `Internal` -> 500 Internal Server Error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Every violation found in the request, reported together
    #[error("Bad request: {}", .0.join(", "))]
    BadRequest(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

/// Body of every error response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: ErrorMessage,
    pub error: &'static str,
}

impl ServerError {
    /// Reads a failed lookup as a 404 when the job does not exist.
    pub fn from_lookup(error: ExecutionServiceError) -> Self {
        match error {
            ExecutionServiceError::Queue(e @ QueueError::JobNotFound { .. }) => ServerError::NotFound(e.to_string()),
            e => ServerError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::BadRequest(violations) => (StatusCode::BAD_REQUEST, ErrorMessage::Many(violations)),
            ServerError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorMessage::One(message)),
            ServerError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorMessage::One(message)),
        };
        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Unknown Error"),
        };
        (status, Json(body)).into_response()
    }
}
