//! Answer service: event ingestion, orchestrated write propagation, and the
//! HTTP health and intake surface.
//!
//! Events flow from an [`ingest::IngestHandle`] through the single
//! [`ingest::EventIngestor`] loop into the [`ingest::Dispatcher`], which hands
//! typed payloads to [`service::AnswerService`]. The service commits each
//! write durably, then fans cache and publish side effects out concurrently
//! under a fixed-interval [`retry::RetryPolicy`].

pub mod config;
pub mod ingest;
pub mod network;
pub mod retry;
pub mod service;
pub mod storage;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
