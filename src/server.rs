use crate::config::QueueMode;
use crate::deferred::{DeferredJob, JobQueue, JobState, Processor, QueueError};
use crate::error::ApiError;
use crate::interaction::{Inbound, InteractionKind, decode_inbound, deferred_ack, pong};
use crate::signature::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const FAST_ACK_PATH: &str = "/api/interactions";
pub const DEFERRED_PATH: &str = "/api/interactions/deferred";

/// Shared by every route; nothing in here is mutated after start-up.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<SignatureVerifier>,
    pub queue: Arc<dyn JobQueue>,
    pub processor: Processor,
    /// The deferred route is only served in [`QueueMode::Forward`].
    pub queue_mode: QueueMode,
    /// Expected `?code=` on the fast-ack route, when set.
    pub handler_key: Option<String>,
    /// Required `?code=` on the deferred route; without it every call is refused.
    pub interaction_key: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RouteParams {
    code: Option<String>,
    warmup: Option<String>,
}

pub async fn health_handler() -> axum::Json<serde_json::Value> {
    axum::Json(json!({ "status": "ok" }))
}

fn warmed_up() -> Response {
    Json(json!("Warmed up")).into_response()
}

fn check_key(expected: Option<&str>, given: Option<&str>) -> Result<(), ApiError> {
    match expected {
        Some(key) if given != Some(key) => {
            warn!("Rejected request with a missing or wrong function key");
            Err(ApiError::Unauthorized("Invalid function key".into()))
        }
        _ => Ok(()),
    }
}

// Unlike `check_key`, an unset key refuses everything.
fn require_key(expected: Option<&str>, given: Option<&str>) -> Result<(), ApiError> {
    match expected {
        Some(_) => check_key(expected, given),
        None => {
            warn!("Rejected deferred request: no function key configured");
            Err(ApiError::Unauthorized("Invalid function key".into()))
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Fast-ack route: answers within the platform's deadline and leaves the
/// real work to the deferred processor.
pub async fn fast_ack_handler(
    State(state): State<AppState>,
    Query(params): Query<RouteParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    check_key(state.handler_key.as_deref(), params.code.as_deref())?;

    let decoded = decode_inbound(&body);
    if matches!(decoded, Ok(Inbound::Warmup)) {
        debug!("Received warmup request.");
        return Ok(warmed_up());
    }

    let verdict = state.verifier.verify(
        &body,
        header_str(&headers, SIGNATURE_HEADER),
        header_str(&headers, TIMESTAMP_HEADER),
    );
    if !verdict.is_valid() {
        warn!("Invalid request signature");
        return Err(ApiError::Unauthorized("Invalid request signature".into()));
    }

    let event = match decoded {
        Ok(Inbound::Event(event)) => event,
        Ok(Inbound::Warmup) => return Ok(warmed_up()),
        Err(e) => return Err(ApiError::BadRequest(format!("invalid interaction body: {e}"))),
    };

    match event.kind {
        InteractionKind::Ping => Ok(Json(pong()).into_response()),
        InteractionKind::Command => {
            let command = event.command_name.clone();
            info!(%command, state = %JobState::Received, "Command received, deferring");

            match state.queue.enqueue(DeferredJob::new(event)).await {
                Ok(()) => info!(%command, state = %JobState::Queued, "Job handed off"),
                Err(QueueError::Closed) => {
                    return Err(ApiError::Internal("job queue is closed".into()));
                }
                // The platform shows its own timeout message; nothing more to do.
                Err(e) => error!(%command, state = %JobState::Dropped, "Error submitting to queue: {e}"),
            }

            info!(%command, state = %JobState::Acked, "Deferred ack sent");
            Ok(Json(deferred_ack()).into_response())
        }
        InteractionKind::Other => Err(ApiError::BadRequest(
            "unsupported interaction type".into(),
        )),
    }
}

/// Deferred route: accepts a job over HTTP and processes it in the
/// background, so a caller that gives up early does not cancel it.
pub async fn deferred_handler(
    State(state): State<AppState>,
    Query(params): Query<RouteParams>,
    body: Bytes,
) -> Result<Response, ApiError> {
    require_key(state.interaction_key.as_deref(), params.code.as_deref())?;

    if params.warmup.is_some() {
        debug!("Received warmup request.");
        return Ok(warmed_up());
    }

    let job = DeferredJob::decode(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid job body: {e}")))?;
    info!(command = %job.payload.command_name, state = %JobState::Queued, "Job received over HTTP");

    let processor = state.processor.clone();
    tokio::spawn(async move {
        processor.process(job).await;
    });

    Ok(Json(json!("OK")).into_response())
}

/// Build the main router: health and fast-ack routes, plus the deferred
/// route when jobs are forwarded over HTTP.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route(FAST_ACK_PATH, post(fast_ack_handler));
    if state.queue_mode == QueueMode::Forward {
        router = router.route(DEFERRED_PATH, post(deferred_handler));
    }
    router.with_state(state)
}
