use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use jobs::job_router;
use public::local_route;

use crate::server::ApiState;

pub(super) mod jobs;
pub(super) mod public;

/// Fallback for routes that do not exist.
pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "The requested resource was not found")
}

pub(crate) fn server_router(state: ApiState) -> Router {
    Router::new().merge(local_route()).nest("/v1", job_router(state)).fallback(handler_404)
}
