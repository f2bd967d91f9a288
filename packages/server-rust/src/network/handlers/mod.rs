//! HTTP handler definitions for the answer service.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for building the router.

pub mod events;
pub mod health;

pub use events::enqueue_event_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use answer_core::Healther;

use super::ShutdownController;
use crate::ingest::IngestHandle;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references and cheap handles so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle state shared with the shutdown path.
    pub shutdown: Arc<ShutdownController>,
    /// Producer side of the event intake queue.
    pub ingest: IngestHandle,
    /// Collaborators polled by the health endpoints.
    pub healthers: Arc<Vec<Arc<dyn Healther>>>,
    /// Process start time, used for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// True when every registered collaborator reports healthy.
    #[must_use]
    pub fn collaborators_healthy(&self) -> bool {
        self.healthers.iter().all(|h| h.is_healthy())
    }
}
