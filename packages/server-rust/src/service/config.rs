use std::time::Duration;

use crate::retry::RetryPolicy;

/// Tuning for [`AnswerService`](super::AnswerService).
///
/// Controls the deadline applied to durable writes and the retry budget
/// applied to each cache and publish operation.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    /// Deadline for a single repository call, and for each individual cache
    /// or publish attempt.
    pub write_timeout: Duration,
    /// Retry budget for each side effect after a durable write.
    pub retry: RetryPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_config_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.retry.attempts(), 3);
        assert_eq!(config.retry.delay(), Duration::from_secs(5));
    }
}
