//! In-process [`Publisher`] over a tokio `broadcast` channel.
//!
//! Downstream consumers call [`BroadcastPublisher::subscribe`]. Publishing
//! with no subscribers is not an error: the message simply has no audience.
//! A subscriber that falls more than `capacity` messages behind skips ahead
//! and sees a `Lagged` error on its next receive.

use std::sync::atomic::{AtomicBool, Ordering};

use answer_core::{Closer, Healther, Publisher};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::trace;

pub const DEFAULT_PUBLISH_CAPACITY: usize = 1024;

/// A payload delivered to subscribers together with its topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Bytes,
}

pub struct BroadcastPublisher {
    tx: broadcast::Sender<PublishedMessage>,
    closed: AtomicBool,
}

impl BroadcastPublisher {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Receives every message published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedMessage> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLISH_CAPACITY)
    }
}

#[async_trait]
impl Publisher for BroadcastPublisher {
    async fn publish(&self, payload: Bytes, topic: &str) -> anyhow::Result<()> {
        if self.closed.load(Ordering::Acquire) {
            anyhow::bail!("publisher is closed");
        }
        let message = PublishedMessage {
            topic: topic.to_string(),
            payload,
        };
        match self.tx.send(message) {
            Ok(receivers) => trace!(topic, receivers, "published"),
            Err(_) => trace!(topic, "published with no subscribers"),
        }
        Ok(())
    }
}

impl Healther for BroadcastPublisher {
    fn is_healthy(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Closer for BroadcastPublisher {
    fn name(&self) -> &'static str {
        "publisher"
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
