use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::entity::Answer;

/// Durable store for answers. Its writes are the source of truth.
/// Implementations: in-memory (tests, local runs), `PostgreSQL`.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Persist an answer together with its elements.
    async fn create_answer(&self, answer: &Answer) -> anyhow::Result<()>;

    /// Delete an answer and its elements. Deleting an absent id is not an error.
    async fn delete_answer(&self, id: Uuid) -> anyhow::Result<()>;
}

/// Key/value cache sitting in front of the repository for readers.
#[async_trait]
pub trait Casher: Send + Sync {
    /// Store an encoded payload under `key`, replacing any previous value.
    async fn write(&self, key: &str, payload: Bytes) -> anyhow::Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Outbound notification channel for downstream subscribers.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Emit an encoded payload on `topic`.
    async fn publish(&self, payload: Bytes, topic: &str) -> anyhow::Result<()>;
}

/// Liveness of a collaborator, polled by the health endpoint.
pub trait Healther: Send + Sync {
    fn is_healthy(&self) -> bool;
}

/// Resource released once during shutdown.
#[async_trait]
pub trait Closer: Send + Sync {
    /// Name used in shutdown logs.
    fn name(&self) -> &'static str;

    async fn close(&self) -> anyhow::Result<()>;
}
