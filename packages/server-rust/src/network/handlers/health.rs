//! Health, liveness, and readiness endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::network::HealthState;

/// Returns detailed health information as JSON.
///
/// Always returns 200 -- the `healthy` and `state` fields in the body say
/// whether collaborators are usable. Status-code based probing belongs to
/// [`readiness_handler`].
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let healthy = state.collaborators_healthy();
    Json(json!({
        "status": if healthy { "OK" } else { "UNHEALTHY" },
        "healthy": healthy,
        "state": state.shutdown.health_state().as_str(),
        "queue_depth": state.ingest.depth(),
        "queue_capacity": state.ingest.capacity(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Liveness probe -- always returns 200 OK while the process responds.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe -- 200 when Ready and every collaborator is healthy,
/// 503 otherwise.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready && state.collaborators_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
