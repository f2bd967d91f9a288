//! Answer orchestration: durable write first, then a retried fan-out.
//!
//! The repository write gates everything. If it fails, nothing else runs.
//! If it succeeds, the cache operation and the publish operation run
//! concurrently, each under its own retry budget, and the call returns after
//! both have finished.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use answer_core::{
    answer_key, Answer, Casher, DeletePayload, Publisher, Repository, TOPIC_ANSWER_CREATED,
    TOPIC_ANSWER_DELETED,
};
use bytes::Bytes;
use tracing::{debug, field, info_span, Instrument, Span};
use uuid::Uuid;

use super::config::ServiceConfig;
use super::error::ServiceError;
use super::fanout::{fan_out, BoxedOperation, FanOutError};
use crate::retry::{retry, RetryPolicy};

/// Sequences durable writes with cache and publish propagation.
///
/// Collaborators are shared across concurrent calls and are expected to be
/// safe under concurrent use; the service takes no locks of its own.
pub struct AnswerService {
    repository: Arc<dyn Repository>,
    casher: Arc<dyn Casher>,
    publisher: Arc<dyn Publisher>,
    config: ServiceConfig,
    span: Span,
}

impl AnswerService {
    /// `span` is the parent of every span this service emits.
    #[must_use]
    pub fn new(
        repository: Arc<dyn Repository>,
        casher: Arc<dyn Casher>,
        publisher: Arc<dyn Publisher>,
        config: ServiceConfig,
        span: Span,
    ) -> Self {
        Self {
            repository,
            casher,
            publisher,
            config,
            span,
        }
    }

    /// Creates an answer, then caches it under `answer:<id>` and publishes it
    /// on `answer.created`. A nil id is replaced with a fresh one first.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Encode`], [`ServiceError::Persist`] or
    ///   [`ServiceError::Deadline`]: nothing was written or propagated.
    /// - [`ServiceError::Propagation`] or [`ServiceError::PropagationAborted`]:
    ///   the answer is stored; cache or subscribers may be stale.
    pub async fn add(&self, mut answer: Answer) -> Result<(), ServiceError> {
        answer.assign_missing_id();
        let id = answer.id;
        let span = info_span!(
            parent: &self.span,
            "add_answer",
            answer_id = %id,
            duration_ms = field::Empty,
            outcome = field::Empty,
        );

        observe(span, async move {
            let payload = serde_json::to_vec(&answer)
                .map(Bytes::from)
                .map_err(|source| ServiceError::Encode { id, source })?;

            self.durable("create", id, self.repository.create_answer(&answer))
                .await?;

            let key = answer_key(&id.to_string());
            self.propagate(
                id,
                vec![
                    self.cache_write(id, key, payload.clone()),
                    self.publish(id, payload, TOPIC_ANSWER_CREATED),
                ],
            )
            .await
        })
        .await
    }

    /// Deletes an answer, then evicts `answer:<id>` and publishes a
    /// [`DeletePayload`] on `answer.deleted`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidId`] when `id` is not a UUID; no collaborator
    /// is called in that case. Otherwise as for [`AnswerService::add`].
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let uid = Uuid::parse_str(id).map_err(|source| ServiceError::InvalidId {
            id: id.to_string(),
            source,
        })?;
        let span = info_span!(
            parent: &self.span,
            "delete_answer",
            answer_id = %uid,
            duration_ms = field::Empty,
            outcome = field::Empty,
        );

        observe(span, async move {
            // Canonical form, so the key and payload match what `add` wrote.
            let canonical = uid.to_string();
            let payload = serde_json::to_vec(&DeletePayload {
                id: canonical.clone(),
            })
            .map(Bytes::from)
            .map_err(|source| ServiceError::Encode { id: uid, source })?;

            self.durable("delete", uid, self.repository.delete_answer(uid))
                .await?;

            self.propagate(
                uid,
                vec![
                    self.cache_delete(uid, answer_key(&canonical)),
                    self.publish(uid, payload, TOPIC_ANSWER_DELETED),
                ],
            )
            .await
        })
        .await
    }

    async fn durable(
        &self,
        op: &'static str,
        id: Uuid,
        write: impl Future<Output = anyhow::Result<()>>,
    ) -> Result<(), ServiceError> {
        let timeout = self.config.write_timeout;
        match tokio::time::timeout(timeout, write).await {
            Ok(Ok(())) => {
                debug!(op, "durable write committed");
                Ok(())
            }
            Ok(Err(source)) => Err(ServiceError::Persist { op, id, source }),
            Err(_elapsed) => Err(ServiceError::Deadline { op, id, timeout }),
        }
    }

    async fn propagate(
        &self,
        id: Uuid,
        operations: Vec<BoxedOperation<ServiceError>>,
    ) -> Result<(), ServiceError> {
        match fan_out(operations).await {
            Ok(()) => Ok(()),
            Err(FanOutError::Failed(err)) => Err(err),
            Err(FanOutError::Aborted { lost, .. }) => {
                Err(ServiceError::PropagationAborted { id, lost })
            }
        }
    }

    fn cache_write(&self, id: Uuid, key: String, payload: Bytes) -> BoxedOperation<ServiceError> {
        let casher = Arc::clone(&self.casher);
        let (policy, timeout) = (self.config.retry, self.config.write_timeout);
        side_effect("cache write", id, policy, move || {
            let casher = Arc::clone(&casher);
            let key = key.clone();
            let payload = payload.clone();
            async move { within(timeout, casher.write(&key, payload)).await }
        })
    }

    fn cache_delete(&self, id: Uuid, key: String) -> BoxedOperation<ServiceError> {
        let casher = Arc::clone(&self.casher);
        let (policy, timeout) = (self.config.retry, self.config.write_timeout);
        side_effect("cache delete", id, policy, move || {
            let casher = Arc::clone(&casher);
            let key = key.clone();
            async move { within(timeout, casher.delete(&key)).await }
        })
    }

    fn publish(&self, id: Uuid, payload: Bytes, topic: &'static str) -> BoxedOperation<ServiceError> {
        let publisher = Arc::clone(&self.publisher);
        let (policy, timeout) = (self.config.retry, self.config.write_timeout);
        side_effect("publish", id, policy, move || {
            let publisher = Arc::clone(&publisher);
            let payload = payload.clone();
            async move { within(timeout, publisher.publish(payload, topic)).await }
        })
    }
}

/// Wraps one retried attempt-producer into a spawnable fan-out operation.
fn side_effect<F, Fut>(
    op: &'static str,
    id: Uuid,
    policy: RetryPolicy,
    attempt: F,
) -> BoxedOperation<ServiceError>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Box::pin(async move {
        retry(policy, attempt)
            .await
            .map_err(|source| ServiceError::Propagation { op, id, source })?;
        debug!(op, "side effect applied");
        Ok(())
    })
}

/// Bounds a single collaborator attempt by `timeout`.
async fn within(
    timeout: Duration,
    attempt: impl Future<Output = anyhow::Result<()>>,
) -> anyhow::Result<()> {
    match tokio::time::timeout(timeout, attempt).await {
        Ok(result) => result,
        Err(_elapsed) => Err(anyhow::anyhow!("deadline of {timeout:?} exceeded")),
    }
}

/// Runs `fut` inside `span`, recording its duration and outcome on the span.
async fn observe<T>(
    span: Span,
    fut: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    let start = Instant::now();
    let result = fut.instrument(span.clone()).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) if e.is_committed() => "partial",
        Err(_) => "error",
    };
    #[allow(clippy::cast_possible_truncation)]
    span.record("duration_ms", start.elapsed().as_millis() as u64);
    span.record("outcome", outcome);
    result
}
