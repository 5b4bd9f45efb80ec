//! Retry with exponential backoff for provider calls.
//!
//! Only `Transient` provider errors are retried; `InvalidInput` and
//! `QuotaExceeded` fail on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use clipline_models::{ProviderError, ProviderResult};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay before retry `attempt` (1-indexed). Doubles per attempt, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        delay.min(self.max_delay)
    }
}

/// Final outcome of a retried provider call.
///
/// `retries_exhausted` is true only when the last error was transient and the
/// whole budget was spent on it.
pub async fn call_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T, (ProviderError, bool)>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                debug!(
                    operation = operation_name,
                    attempt,
                    ?delay,
                    "Transient provider error, backing off: {}",
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                let exhausted = e.is_transient();
                return Err((e, exhausted));
            }
        }
    }
}
