//! Retry with exponential backoff

use dlms_core::DlmsResult;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently a failed call is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry, doubled for every further one
    pub base_delay: Duration,
    /// Upper bound of the exponential part
    pub max_delay: Duration,
    /// Maximum random delay added on top
    pub jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration, jitter: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: max_delay.max(base_delay),
            jitter,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// A single attempt, never retried
    pub fn none() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Delay before retry number `retry` (1-indexed)
    pub fn delay_for<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let backoff = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        if self.jitter.is_zero() {
            backoff
        } else {
            let jitter_ms = rng.gen_range(0..=self.jitter.as_millis() as u64);
            backoff + Duration::from_millis(jitter_ms)
        }
    }

    /// Run `operation` until it succeeds, fails permanently or the budget is spent
    ///
    /// `operation` receives the attempt number starting at 0. Only errors
    /// whose [`is_retryable`](dlms_core::DlmsError::is_retryable) is true are
    /// retried; the last error is returned otherwise.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> DlmsResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = DlmsResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for(attempt, &mut rand::thread_rng());
                    log::warn!(
                        "Attempt failed: {}; retry {}/{} in {:?}",
                        e,
                        attempt,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            Duration::from_millis(200),
            Duration::from_secs(5),
            Duration::from_millis(100),
        )
    }
}
