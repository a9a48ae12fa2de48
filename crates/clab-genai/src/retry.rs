//! Retry policy for rate-limited generative calls.
//!
//! Only rate-limit/quota failures are retried. The delay starts at the base
//! delay and doubles after every attempt; there is no jitter and no cap.
//! Every other failure is returned on the spot.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info_span, warn, Instrument};

use crate::error::GenAiResult;
use crate::metrics::record_retry;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5000);

/// Bounded exponential backoff for rate-limited calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Create policy from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_retries: std::env::var("GENAI_RETRY_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_RETRIES),
            base_delay: Duration::from_millis(
                std::env::var("GENAI_RETRY_BASE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_BASE_DELAY.as_millis() as u64),
            ),
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay slept before retry number `retry` (0-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Execute `op`, retrying rate-limit failures with backoff.
    ///
    /// Exhausting the retries returns the last rate-limit error.
    pub async fn run<T, F, Fut>(&self, operation: &str, op: F) -> GenAiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = GenAiResult<T>>,
    {
        let mut retry = 0u32;

        loop {
            let span = info_span!("genai_call", operation = %operation, attempt = retry + 1);

            match op().instrument(span).await {
                Ok(value) => {
                    if retry > 0 {
                        debug!(operation = %operation, retries = retry, "Recovered after rate limiting");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && retry < self.max_retries => {
                    let delay = self.delay_for_retry(retry);
                    warn!(
                        operation = %operation,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Quota exceeded, retrying: {}",
                        e
                    );
                    record_retry(operation);
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Execute an async operation under `policy`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, op: F) -> GenAiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = GenAiResult<T>>,
{
    policy.run(operation, op).await
}
