//! Fixed-interval retry for fallible async operations.
//!
//! No exponential backoff and no jitter: every gap between attempts is the
//! same `delay`. Used for startup connections and for every cache and publish
//! call made after a durable write.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Number of attempts and the pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy. `attempts` is clamped to at least 1.
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            delay,
        }
    }

    /// Total number of invocations, including the first.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Returned once the retry budget is spent.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    #[error("gave up after {attempts} attempts: {source:#}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
}

impl RetryError {
    /// The error from the final attempt.
    #[must_use]
    pub fn last_error(&self) -> &anyhow::Error {
        match self {
            Self::Exhausted { source, .. } => source,
        }
    }
}

/// Runs `op` until it succeeds or `policy.attempts()` invocations have failed,
/// sleeping `policy.delay()` after each failure except the last.
///
/// # Errors
///
/// Returns [`RetryError::Exhausted`] wrapping the last observed error.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(source) if attempt >= policy.attempts => {
                return Err(RetryError::Exhausted {
                    attempts: policy.attempts,
                    source,
                });
            }
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts = policy.attempts,
                    error = %err,
                    "attempt failed, retrying in {:?}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use tokio::time::Instant;

    use super::*;

    fn failing_until(succeed_on: u32, calls: Arc<AtomicU32>) -> impl FnMut() -> std::future::Ready<anyhow::Result<u32>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= succeed_on {
                std::future::ready(Ok(n))
            } else {
                std::future::ready(Err(anyhow::anyhow!("failure #{n}")))
            }
        }
    }

    #[test]
    fn zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn default_policy_is_three_attempts_five_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_makes_one_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let start = Instant::now();
        let value = retry(policy, failing_until(1, calls.clone())).await.unwrap();

        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_last_attempt() {
        // Fails N-1 times, then succeeds: exactly N invocations.
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(4, Duration::from_millis(100));

        let value = retry(policy, failing_until(4, calls.clone())).await.unwrap();

        assert_eq!(value, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_returns_last_error_after_all_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let start = Instant::now();
        let err = retry(policy, failing_until(u32::MAX, calls.clone()))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.last_error().to_string(), "failure #3");
        assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
        // Two sleeps between three attempts, none after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_never_sleeps() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(1, Duration::from_secs(60));

        let start = Instant::now();
        let result = retry(policy, failing_until(u32::MAX, calls.clone())).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn exhausted_message_names_attempts_and_cause() {
        let err = RetryError::Exhausted {
            attempts: 3,
            source: anyhow::anyhow!("connection refused"),
        };
        assert_eq!(err.to_string(), "gave up after 3 attempts: connection refused");
    }
}
