use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::server::error::{ServerError, ServerResult};
use crate::server::ApiState;
use crate::service::SubscriptionItem;
use crate::types::jobs::TracingOptions;
use crate::types::request::ExecutionRequest;

#[derive(Deserialize)]
pub struct JobId {
    #[serde(rename = "jobId")]
    pub id: String,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

/// Handles execution requests.
///
/// The body is validated as a whole before anything is enqueued, so a rejected request lists
/// every violated constraint. The `traceparent` and `tracestate` headers, when present, are
/// stored with the job and used as the remote parent of the worker's span.
///
/// # Returns
/// * `201 Created` with `{id, timestamp}` of the enqueued job
///
/// # Errors
/// * `ServerError::BadRequest` - If the body is not JSON, validation fails or the queue rejects the job
#[instrument(skip_all)]
async fn handle_execute_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(body) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected unreadable execution request");
        ServerError::BadRequest(vec![rejection.body_text()])
    })?;

    let request = ExecutionRequest::validate(&body).map_err(|violations| {
        warn!(violations = %violations, "Rejected execution request");
        ServerError::BadRequest(violations.0)
    })?;

    let tracing_options =
        TracingOptions { traceparent: header(&headers, "traceparent"), tracestate: header(&headers, "tracestate") };

    match state.service.execute(request, tracing_options).await {
        Ok(enqueued) => {
            info!(job_id = %enqueued.id, "Execution request accepted");
            Ok((StatusCode::CREATED, Json(enqueued)))
        }
        Err(e) => {
            error!(error = %e, "Failed to enqueue execution request");
            Err(ServerError::BadRequest(vec![e.to_string()]))
        }
    }
}

/// Returns the current state of a job, including failed jobs evicted from the primary index.
#[instrument(skip(state), fields(job_id = %id))]
async fn handle_get_job_request(
    Path(JobId { id }): Path<JobId>,
    State(state): State<ApiState>,
) -> ServerResult<impl IntoResponse> {
    let job = state.service.get_job_by_id(&id).await.map_err(ServerError::from_lookup)?;
    Ok(Json(job))
}

fn to_sse_event(item: SubscriptionItem) -> Event {
    let event = match item {
        Ok(event) => Event::default().json_data(event),
        Err(e) => Event::default().event("error").json_data(json!({ "message": e.to_string() })),
    };
    event.unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

/// Streams the events of a job as Server-Sent Events.
///
/// Progress updates are pushed as they happen. The stream closes after the completion event, or
/// after an `error` event carrying the failure reason, or when the server shuts down. Dropping the
/// connection removes the subscription's queue listener.
///
/// # Errors
/// * `ServerError::NotFound` - If the job does not exist, before any event is sent
#[instrument(skip(state), fields(job_id = %id))]
async fn handle_subscribe_request(
    Path(JobId { id }): Path<JobId>,
    State(state): State<ApiState>,
) -> ServerResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let subscription = state.service.subscribe_to_job_by_id(&id).await.map_err(ServerError::from_lookup)?;
    info!("Job subscription opened");
    let events = subscription.map(|item| Ok(to_sse_event(item))).take_until(state.shutdown.cancelled_owned());
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

pub(super) fn job_router(state: ApiState) -> Router {
    Router::new()
        .route("/execute", post(handle_execute_request))
        .route("/job/:jobId", get(handle_get_job_request))
        .route("/job/subscribe/:jobId", get(handle_subscribe_request))
        .with_state(state)
}
