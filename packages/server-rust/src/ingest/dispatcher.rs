//! Type-based routing of events to the answer service.
//!
//! Malformed or invalid payloads stop here: they are logged and dropped,
//! never retried, since a bad payload will not repair itself. Unknown event
//! types are a forward-compatibility no-op, not an error.

use std::sync::Arc;

use answer_core::{Answer, Event, EventKind, ValidationError};
use serde::Deserialize;
use tracing::{error, info, info_span, warn, Instrument, Span};

use crate::service::{AnswerService, ServiceError};

/// Why an event was dropped before reaching the service.
#[derive(Debug, thiserror::Error)]
pub enum RejectReason {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid answer: {0}")]
    Invalid(#[from] ValidationError),
    #[error("missing answer id")]
    MissingId,
}

/// Result of dispatching one event.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The service call succeeded.
    Processed,
    /// The payload was dropped before any service call.
    Rejected(RejectReason),
    /// The service returned an error; see [`ServiceError::is_committed`].
    Failed(ServiceError),
    /// Unrecognized event type.
    Ignored,
}

#[derive(Deserialize)]
struct DeleteRequest {
    #[serde(default)]
    id: String,
}

/// Stateless router from [`Event`] to [`AnswerService`] calls.
pub struct Dispatcher {
    service: Arc<AnswerService>,
    span: Span,
}

impl Dispatcher {
    #[must_use]
    pub fn new(service: Arc<AnswerService>, span: Span) -> Self {
        Self { service, span }
    }

    /// Decodes, validates, and forwards one event. Never retries.
    pub async fn dispatch(&self, event: Event) -> DispatchOutcome {
        let span = info_span!(
            parent: &self.span,
            "dispatch",
            event_id = %event.id,
            event_type = %event.event_type,
        );
        async move {
            match event.kind() {
                EventKind::AnswerCreate => self.handle_create(&event).await,
                EventKind::AnswerDelete => self.handle_delete(&event).await,
                EventKind::Unknown => {
                    warn!("unknown event type received");
                    DispatchOutcome::Ignored
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn handle_create(&self, event: &Event) -> DispatchOutcome {
        let mut answer: Answer = match serde_json::from_slice(&event.payload) {
            Ok(answer) => answer,
            Err(err) => {
                error!(error = %err, "failed to decode answer creation payload");
                return DispatchOutcome::Rejected(err.into());
            }
        };

        answer.assign_missing_id();
        if let Err(err) = answer.validate_submission() {
            error!(answer_id = %answer.id, error = %err, "invalid answer data in creation event");
            return DispatchOutcome::Rejected(err.into());
        }

        let id = answer.id;
        match self.service.add(answer).await {
            Ok(()) => {
                info!(answer_id = %id, "processed answer creation event");
                DispatchOutcome::Processed
            }
            Err(err) => {
                error!(
                    answer_id = %id,
                    committed = err.is_committed(),
                    error = %err,
                    "failed to add answer"
                );
                DispatchOutcome::Failed(err)
            }
        }
    }

    async fn handle_delete(&self, event: &Event) -> DispatchOutcome {
        let request: DeleteRequest = match serde_json::from_slice(&event.payload) {
            Ok(request) => request,
            Err(err) => {
                error!(error = %err, "failed to decode answer deletion payload");
                return DispatchOutcome::Rejected(err.into());
            }
        };

        if request.id.is_empty() {
            error!("missing answer id in deletion event");
            return DispatchOutcome::Rejected(RejectReason::MissingId);
        }

        match self.service.delete(&request.id).await {
            Ok(()) => {
                info!(answer_id = %request.id, "processed answer deletion event");
                DispatchOutcome::Processed
            }
            Err(err) => {
                error!(
                    answer_id = %request.id,
                    committed = err.is_committed(),
                    error = %err,
                    "failed to delete answer"
                );
                DispatchOutcome::Failed(err)
            }
        }
    }
}
