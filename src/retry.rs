//! Exponential backoff for transient failures

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff policy: delay doubles from `base_delay` up to `max_delay`.
///
/// `max_attempts = None` retries forever; a dependency that never recovers
/// stalls the caller, which the delivery loop accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts: None,
        }
    }

    pub fn bounded(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.min(31)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    /// Run `op`, retrying errors accepted by `is_retryable`.
    ///
    /// Errors rejected by the predicate, and the last error once the attempt
    /// budget is spent, are returned unchanged.
    pub async fn run<T, F, Fut, P>(&self, label: &str, mut op: F, is_retryable: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&crate::error::Error) -> bool,
    {
        let mut attempts = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempts += 1;
                    if !is_retryable(&e) || self.exhausted(attempts) {
                        return Err(e);
                    }
                    let delay = self.delay_for(attempts - 1);
                    warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "{} failed, retrying: {}",
                        label,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    fn fast(max_attempts: Option<u32>) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            max_attempts,
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::unbounded(Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for(100), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Cell::new(0u32);
        let result = fast(None)
            .run(
                "op",
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move {
                        if n < 4 {
                            Err(Error::Notify("flaky".to_string()))
                        } else {
                            Ok(n)
                        }
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_stops_on_non_retryable_error() {
        let calls = Cell::new(0u32);
        let result: Result<()> = fast(None)
            .run(
                "op",
                || {
                    calls.set(calls.get() + 1);
                    async { Err(Error::Config("bad".to_string())) }
                },
                Error::is_transient,
            )
            .await;

        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_bounded_policy_gives_up() {
        let calls = Cell::new(0u32);
        let result: Result<()> = fast(Some(3))
            .run(
                "op",
                || {
                    calls.set(calls.get() + 1);
                    async { Err(Error::Notify("nope".to_string())) }
                },
                |_| true,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }
}
