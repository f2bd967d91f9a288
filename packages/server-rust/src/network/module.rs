//! Network module with deferred startup lifecycle.
//!
//! `new()` collects shared state, `start()` binds the TCP listener, and
//! `serve()` starts accepting connections. The ingestion loop and the
//! collaborators are wired between `start()` and `serve()`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use answer_core::Healther;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use super::config::NetworkConfig;
use super::handlers::{
    enqueue_event_handler, health_handler, liveness_handler, readiness_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::ingest::IngestHandle;
use crate::retry::{retry, RetryPolicy};

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` -- takes the shutdown controller, intake handle and health sources
/// 2. `start()` -- binds the TCP listener, retrying per the given policy
/// 3. `serve()` -- accepts connections until the shutdown future resolves
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    ingest: IngestHandle,
    healthers: Arc<Vec<Arc<dyn Healther>>>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        shutdown: Arc<ShutdownController>,
        ingest: IngestHandle,
        healthers: Vec<Arc<dyn Healther>>,
    ) -> Self {
        Self {
            config,
            listener: None,
            shutdown,
            ingest,
            healthers: Arc::new(healthers),
        }
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    /// - `POST /events` -- event intake
    pub fn build_router(&self) -> Router {
        let state = AppState {
            shutdown: Arc::clone(&self.shutdown),
            ingest: self.ingest.clone(),
            healthers: Arc::clone(&self.healthers),
            start_time: Instant::now(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route("/events", post(enqueue_event_handler))
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured port
    /// when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error once every bind attempt allowed by `policy` failed.
    pub async fn start(&mut self, policy: RetryPolicy) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let addr = addr.as_str();
        let listener = retry(policy, || async move {
            TcpListener::bind(addr).await.map_err(anyhow::Error::from)
        })
        .await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves, then stops accepting
    /// and waits for in-flight requests.
    ///
    /// Health moves to Ready as serving begins and to Draining once the
    /// server returns.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();

        self.shutdown.set_ready();
        info!("serving HTTP connections");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        self.shutdown.trigger_shutdown();
        Ok(())
    }
}
