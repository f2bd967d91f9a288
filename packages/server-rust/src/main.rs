//! `answer-service` binary: wires collaborators, runs the ingestion loop and
//! the HTTP surface, and tears everything down on SIGINT or SIGTERM.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use answer_core::{Closer, Healther, Repository};
use answer_server::ingest::{Dispatcher, EventIngestor};
use answer_server::network::{NetworkModule, ShutdownController};
use answer_server::service::AnswerService;
use answer_server::storage::MemoryRepository;
use answer_server::transport::{BroadcastPublisher, MemoryCache};
use answer_server::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::parse();
    init_tracing(config.log_json);

    info!(port = config.port, "starting answer-service");

    let (repository, mut closers) = build_repository(&config).await?;
    let cache = Arc::new(MemoryCache::new(config.cache_capacity));
    let publisher = Arc::new(BroadcastPublisher::default());
    spawn_publish_log(&publisher);

    closers.push(cache.clone());
    closers.push(publisher.clone());
    let healthers: Vec<Arc<dyn Healther>> = vec![cache.clone(), publisher.clone()];

    let service = Arc::new(AnswerService::new(
        repository,
        cache,
        publisher,
        config.service_config(),
        info_span!("answer_service"),
    ));
    let ingestor = EventIngestor::new(
        Dispatcher::new(service, info_span!("dispatcher")),
        config.queue_capacity,
        info_span!("ingestor"),
    );

    let shutdown = Arc::new(ShutdownController::new());
    let mut network = NetworkModule::new(
        config.network_config(),
        Arc::clone(&shutdown),
        ingestor.handle(),
        healthers,
    );
    network.start(config.connect_policy()).await?;

    let ingest_task = tokio::spawn(ingestor.run(shutdown.shutdown_receiver()));

    let server_result = network.serve(shutdown_signal()).await;

    shutdown.trigger_shutdown();
    match ingest_task.await {
        Ok(stats) => info!(
            processed = stats.processed,
            rejected = stats.rejected,
            failed = stats.failed,
            ignored = stats.ignored,
            "ingestion loop finished"
        ),
        Err(err) => warn!(error = %err, "ingestion loop ended abnormally"),
    }

    let failures = shutdown.close_all(&closers).await;
    if failures > 0 {
        warn!(failures, "some collaborators failed to close");
    }
    info!("answer-service stopped");

    server_result
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("answer_server=info,answer_service=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(feature = "postgres")]
async fn build_repository(
    config: &AppConfig,
) -> Result<(Arc<dyn Repository>, Vec<Arc<dyn Closer>>)> {
    use answer_server::retry::retry;
    use answer_server::storage::PostgresRepository;

    let Some(url) = config.database_url.as_deref() else {
        info!("no database configured, keeping answers in memory");
        return Ok((Arc::new(MemoryRepository::new()), Vec::new()));
    };

    let repository = retry(config.connect_policy(), || async move {
        PostgresRepository::connect(url, 10).await
    })
    .await?;
    repository.initialize().await?;
    info!("connected to postgres");

    let repository = Arc::new(repository);
    Ok((repository.clone(), vec![repository as Arc<dyn Closer>]))
}

#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
async fn build_repository(
    config: &AppConfig,
) -> Result<(Arc<dyn Repository>, Vec<Arc<dyn Closer>>)> {
    if config.database_url.is_some() {
        anyhow::bail!("DATABASE_URL is set but this build lacks the `postgres` feature");
    }
    info!("keeping answers in memory");
    Ok((Arc::new(MemoryRepository::new()), Vec::new()))
}

/// Logs every published message at debug level until the publisher closes.
fn spawn_publish_log(publisher: &BroadcastPublisher) {
    let mut rx = publisher.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message) => debug!(
                    topic = %message.topic,
                    bytes = message.payload.len(),
                    "message published"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "publish log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}
