//! Process configuration parsed from flags and environment variables.

use std::time::Duration;

use clap::Parser;

use crate::ingest::DEFAULT_QUEUE_CAPACITY;
use crate::network::NetworkConfig;
use crate::retry::RetryPolicy;
use crate::service::ServiceConfig;
use crate::transport::DEFAULT_CACHE_CAPACITY;

#[derive(Debug, Clone, Parser)]
#[command(name = "answer-service", about = "Answer event ingestion and write propagation")]
pub struct AppConfig {
    /// Bind address for the HTTP surface.
    #[arg(long, env = "ANSWER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "ANSWER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Events held in the intake queue before producers are refused.
    #[arg(long, env = "ANSWER_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Deadline for each durable write and each side-effect attempt.
    #[arg(long, env = "ANSWER_WRITE_TIMEOUT_SECS", default_value_t = 10)]
    pub write_timeout_secs: u64,

    /// Attempts per cache or publish operation, including the first.
    #[arg(long, env = "ANSWER_RETRY_ATTEMPTS", default_value_t = 3)]
    pub retry_attempts: u32,

    #[arg(long, env = "ANSWER_RETRY_DELAY_SECS", default_value_t = 5)]
    pub retry_delay_secs: u64,

    /// Attempts for startup connections (database pool, listener bind).
    #[arg(long, env = "ANSWER_CONNECT_ATTEMPTS", default_value_t = 10)]
    pub connect_attempts: u32,

    #[arg(long, env = "ANSWER_CONNECT_DELAY_SECS", default_value_t = 10)]
    pub connect_delay_secs: u64,

    /// `PostgreSQL` URL. Answers are kept in memory when unset.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "ANSWER_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,

    /// Emit logs as JSON lines.
    #[arg(long, env = "ANSWER_LOG_JSON")]
    pub log_json: bool,
}

impl AppConfig {
    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            retry: RetryPolicy::new(self.retry_attempts, Duration::from_secs(self.retry_delay_secs)),
        }
    }

    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            ..NetworkConfig::default()
        }
    }

    /// Retry budget for connections made while starting up.
    #[must_use]
    pub fn connect_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.connect_attempts,
            Duration::from_secs(self.connect_delay_secs),
        )
    }
}
