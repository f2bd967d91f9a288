//! HTTP intake for event envelopes.
//!
//! A thin producer in front of the ingestion queue: it never waits for the
//! event to be processed, and a full queue is reported straight back to the
//! caller so it can redeliver later.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::warn;

use answer_core::Event;

use super::AppState;
use crate::network::HealthState;

/// Handles `POST /events`.
///
/// Returns `202 Accepted` once queued, `503 Service Unavailable` when the
/// queue is full or the service is not accepting work. Bodies that are not a
/// valid envelope are rejected by the `Json` extractor with a 4xx status.
pub async fn enqueue_event_handler(
    State(state): State<AppState>,
    Json(event): Json<Event>,
) -> (StatusCode, Json<serde_json::Value>) {
    let event_id = event.id.clone();

    let health = state.shutdown.health_state();
    if health != HealthState::Ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "id": event_id, "error": format!("service is {}", health.as_str()) })),
        );
    }

    match state.ingest.enqueue(event) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(json!({ "id": event_id, "status": "queued" })),
        ),
        Err(err) => {
            warn!(event_id = %event_id, error = %err, "rejected inbound event");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "id": event_id, "error": err.to_string() })),
            )
        }
    }
}
