//! Bounded event intake and the single consumption loop.
//!
//! Producers enqueue through a non-blocking [`IngestHandle`]; a full queue is
//! reported back to them immediately. One loop pulls events in order and
//! dispatches each to completion before pulling the next.

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, Instrument, Span};

use answer_core::Event;

use super::dispatcher::{DispatchOutcome, Dispatcher};

/// Intake queue size used when none is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Back-pressure and lifecycle errors returned to producers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("event queue is full, dropping event {event_id}")]
    QueueFull { event_id: String },
    #[error("event queue is closed, dropping event {event_id}")]
    Closed { event_id: String },
}

/// Cloneable producer side of the intake queue.
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<Event>,
}

impl IngestHandle {
    /// Places `event` on the queue without waiting.
    ///
    /// # Errors
    ///
    /// [`IngestError::QueueFull`] when the queue is at capacity, and
    /// [`IngestError::Closed`] once the consumption loop has gone away. The
    /// event is dropped in both cases; redelivery is the producer's concern.
    pub fn enqueue(&self, event: Event) -> Result<(), IngestError> {
        self.tx.try_send(event).map_err(|err| match err {
            TrySendError::Full(event) => IngestError::QueueFull { event_id: event.id },
            TrySendError::Closed(event) => IngestError::Closed { event_id: event.id },
        })
    }

    /// Number of events waiting to be pulled.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Per-outcome counts for one run of the loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub processed: u64,
    pub rejected: u64,
    pub failed: u64,
    pub ignored: u64,
}

impl IngestStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Processed => self.processed += 1,
            DispatchOutcome::Rejected(_) => self.rejected += 1,
            DispatchOutcome::Failed(_) => self.failed += 1,
            DispatchOutcome::Ignored => self.ignored += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.processed + self.rejected + self.failed + self.ignored
    }
}

/// Owns the intake queue and feeds the [`Dispatcher`] one event at a time.
pub struct EventIngestor {
    handle: IngestHandle,
    rx: mpsc::Receiver<Event>,
    dispatcher: Dispatcher,
    span: Span,
}

impl EventIngestor {
    /// Creates the ingestor with a queue of `capacity` events (at least 1).
    #[must_use]
    pub fn new(dispatcher: Dispatcher, capacity: usize, span: Span) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            handle: IngestHandle { tx },
            rx,
            dispatcher,
            span,
        }
    }

    /// Producer handle; stays usable while [`EventIngestor::run`] owns the loop.
    #[must_use]
    pub fn handle(&self) -> IngestHandle {
        self.handle.clone()
    }

    /// Same as [`IngestHandle::enqueue`].
    ///
    /// # Errors
    ///
    /// See [`IngestHandle::enqueue`].
    pub fn enqueue(&self, event: Event) -> Result<(), IngestError> {
        self.handle.enqueue(event)
    }

    /// Processes events until `shutdown` flips to `true` or its sender drops.
    ///
    /// Events still queued at that point are not processed. Side effects
    /// already spawned by an in-progress dispatch finish on their own.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> IngestStats {
        let span = self.span.clone();
        async move {
            let mut stats = IngestStats::default();
            info!(capacity = self.handle.capacity(), "starting event ingestion");

            if *shutdown.borrow_and_update() {
                info!("shutdown already signalled, event ingestion not started");
                return stats;
            }

            loop {
                tokio::select! {
                    biased;

                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("received shutdown signal, stopping event ingestion");
                            break;
                        }
                    }
                    event = self.rx.recv() => {
                        let Some(event) = event else { break };
                        let outcome = self.dispatcher.dispatch(event).await;
                        stats.record(&outcome);
                    }
                }
            }

            debug!(
                pending = self.handle.depth(),
                processed = stats.processed,
                rejected = stats.rejected,
                failed = stats.failed,
                ignored = stats.ignored,
                "event ingestion stopped"
            );
            stats
        }
        .instrument(span)
        .await
    }
}
