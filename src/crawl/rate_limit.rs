//! Request throttling for page probes

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::time::Duration;
use tracing::trace;

/// Enforces a minimum spacing between scan probes
pub struct ProbeThrottle {
    limiter: Option<DefaultDirectRateLimiter>,
}

impl ProbeThrottle {
    /// One request per `min_interval`; a zero interval disables throttling
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(nonzero!(1u32))));

        Self { limiter }
    }

    /// Wait until the next probe is allowed
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                trace!("Probe throttled");
                limiter.until_ready().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_probe_throttle_spaces_requests() {
        let throttle = ProbeThrottle::new(Duration::from_millis(100));

        let start = Instant::now();
        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;
        let elapsed = start.elapsed();

        // Three probes need at least two intervals
        assert!(elapsed >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_wait() {
        let throttle = ProbeThrottle::new(Duration::ZERO);

        let start = Instant::now();
        for _ in 0..50 {
            throttle.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
