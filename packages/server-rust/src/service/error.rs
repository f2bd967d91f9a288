use std::time::Duration;

use uuid::Uuid;

use crate::retry::RetryError;

/// Errors returned by [`AnswerService`](super::AnswerService).
///
/// [`ServiceError::is_committed`] separates failures that happened before the
/// durable write (nothing changed) from failures of the side effects that run
/// after it (the record exists, cache and subscribers may lag).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid answer id format: {id}")]
    InvalidId {
        id: String,
        #[source]
        source: uuid::Error,
    },
    #[error("failed to encode answer {id}: {source}")]
    Encode {
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to {op} answer {id}: {source:#}")]
    Persist {
        op: &'static str,
        id: Uuid,
        #[source]
        source: anyhow::Error,
    },
    #[error("{op} answer {id} exceeded deadline of {timeout:?}")]
    Deadline {
        op: &'static str,
        id: Uuid,
        timeout: Duration,
    },
    #[error("answer {id} committed, {op} failed: {source}")]
    Propagation {
        op: &'static str,
        id: Uuid,
        #[source]
        source: RetryError,
    },
    #[error("answer {id} committed, {lost} propagation task(s) ended without a result")]
    PropagationAborted { id: Uuid, lost: usize },
}

impl ServiceError {
    /// True when the durable write succeeded and only a side effect failed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            Self::Propagation { .. } | Self::PropagationAborted { .. }
        )
    }
}
