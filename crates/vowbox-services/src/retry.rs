//! Bounded retry with exponential backoff
//!
//! Every failure is classified into a [`FileError`] first. Only retryable kinds
//! (storage and processing) are attempted again; the delay before attempt `n + 1`
//! is `base_delay * 2^(n-1)`. Sleeping goes through the [`Sleeper`] trait so tests
//! can record delays instead of waiting.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use vowbox_core::constants::{DEFAULT_MAX_FILE_RETRIES, DEFAULT_RETRY_DELAY_MS};
use vowbox_core::{classify, is_retryable, FileError, RetryConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay to wait after failed attempt `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_FILE_RETRIES,
            Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        )
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_file_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// runs out of attempts. The last error is returned classified, with
    /// `operation_name` as context for foreign errors.
    pub async fn run<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, FileError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<anyhow::Error>,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(
                            operation = %operation_name,
                            attempt,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) => classify(e.into(), Some(operation_name)),
            };

            if !is_retryable(&err) {
                return Err(err);
            }

            if attempt >= max_attempts {
                tracing::warn!(
                    operation = %operation_name,
                    attempts = attempt,
                    error = %err,
                    "Operation failed, giving up"
                );
                return Err(err);
            }

            let delay = self.policy.delay_for_attempt(attempt);
            tracing::warn!(
                operation = %operation_name,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Operation failed, retrying"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Retry `operation` up to `max_retries` attempts with a real timer.
pub async fn retry<T, E, F, Fut>(operation: F, max_retries: u32, base_delay_ms: u64) -> Result<T, FileError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<anyhow::Error>,
{
    RetryExecutor::new(RetryPolicy::new(
        max_retries,
        Duration::from_millis(base_delay_ms),
    ))
    .run("Operation", operation)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use vowbox_core::ValidationKind;

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn executor(max_retries: u32, base_ms: u64) -> (RetryExecutor, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let executor = RetryExecutor::with_sleeper(
            RetryPolicy::new(max_retries, Duration::from_millis(base_ms)),
            sleeper.clone(),
        );
        (executor, sleeper)
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&RetryConfig::default());
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_retryable_error_exhausts_attempts() {
        let (executor, sleeper) = executor(3, 100);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), FileError> = executor
            .run("Upload", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FileError::storage("connection reset"))
            })
            .await;

        assert!(matches!(result, Err(FileError::Storage { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn test_validation_error_is_not_retried() {
        let (executor, sleeper) = executor(3, 100);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), FileError> = executor
            .run("Upload", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FileError::validation(ValidationKind::InvalidType, "nope"))
            })
            .await;

        assert!(matches!(result, Err(FileError::Validation { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let (executor, _) = executor(3, 100);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), FileError> = executor
            .run("Delete", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FileError::not_found("k"))
            })
            .await;

        assert!(matches!(result, Err(FileError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failure() {
        let (executor, sleeper) = executor(3, 50);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = executor
            .run("Upload", || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(anyhow::anyhow!("timeout"))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_millis(50)]
        );
    }

    #[tokio::test]
    async fn test_foreign_error_classified_with_context() {
        let (executor, _) = executor(1, 10);

        let err = executor
            .run("Upload main asset", || async move {
                Err::<(), _>(anyhow::anyhow!("socket closed"))
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Upload main asset: socket closed");
    }

    #[tokio::test]
    async fn test_zero_retries_still_attempts_once() {
        let (executor, _) = executor(0, 10);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let _ = executor
            .run("Upload", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FileError::storage("boom"))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_free_function_retry() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let value = retry(
            || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FileError::storage("flaky"))
                } else {
                    Ok(7)
                }
            },
            3,
            1,
        )
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
