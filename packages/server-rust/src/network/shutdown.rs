//! Shutdown signalling and collaborator teardown.
//!
//! Uses `ArcSwap` for lock-free health state transitions and a `watch`
//! channel to tell long-running loops (the ingestion loop, the HTTP server)
//! to stop.

use std::sync::Arc;

use answer_core::Closer;
use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::{error, info};

/// Service lifecycle state, transitioned by the shutdown controller.
///
/// State machine: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Collaborators are being wired up.
    Starting,
    /// Accepting and processing events.
    Ready,
    /// Shutdown requested; no new events are pulled.
    Draining,
    /// Collaborators have been closed.
    Stopped,
}

impl HealthState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

/// Coordinates shutdown across the service:
/// 1. Health probes read `health_state()`
/// 2. Loops select on `shutdown_receiver()`
/// 3. `trigger_shutdown()` moves to Draining and signals every receiver
/// 4. `close_all()` releases collaborators and moves to Stopped
#[derive(Debug)]
pub struct ShutdownController {
    shutdown_signal: watch::Sender<bool>,
    health_state: Arc<ArcSwap<HealthState>>,
}

impl ShutdownController {
    /// Creates a new shutdown controller in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            shutdown_signal: tx,
            health_state: Arc::new(ArcSwap::from_pointee(HealthState::Starting)),
        }
    }

    pub fn set_ready(&self) {
        self.health_state.store(Arc::new(HealthState::Ready));
    }

    /// Returns a receiver that flips to `true` when shutdown is triggered.
    #[must_use]
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_signal.subscribe()
    }

    /// Transitions to `Draining` and signals all shutdown receivers.
    pub fn trigger_shutdown(&self) {
        self.health_state.store(Arc::new(HealthState::Draining));
        // Ignore send errors -- receivers may have been dropped
        let _ = self.shutdown_signal.send(true);
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.health_state.load()
    }

    /// Closes every collaborator in order, logging (not propagating) failures,
    /// then transitions to `Stopped`. Returns the number of failed closes.
    pub async fn close_all(&self, closers: &[Arc<dyn Closer>]) -> usize {
        let mut failures = 0;
        for closer in closers {
            match closer.close().await {
                Ok(()) => info!(closer = closer.name(), "closed"),
                Err(err) => {
                    failures += 1;
                    error!(closer = closer.name(), error = %err, "error closing");
                }
            }
        }
        self.health_state.store(Arc::new(HealthState::Stopped));
        failures
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
