//! Rate-Limit Retry
//!
//! A higher-order wrapper every outbound model call composes. Only failures
//! carrying a rate-limit signature are retried; everything else propagates
//! unchanged on the first attempt.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::LlmError;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default delay before the first retry. Each further retry doubles it.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 5_000;

/// Bounded exponential back-off policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay_ms: initial_delay.as_millis() as u64,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Wait before retry number `retry` (0-based): `initial × 2^retry`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_delay().saturating_mul(factor)
    }

    /// Total added latency when every retry is consumed.
    pub fn worst_case_delay(&self) -> Duration {
        (0..self.max_retries)
            .map(|r| self.delay_for_retry(r))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Failures that can tell whether they were caused by rate limiting.
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;
}

impl RateLimitSignal for LlmError {
    fn is_rate_limited(&self) -> bool {
        LlmError::is_rate_limited(self)
    }
}

/// Run `operation`, retrying rate-limited failures per `policy`.
///
/// Makes at most `max_retries + 1` calls. The failure from the last call is
/// returned as-is.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RateLimitSignal + fmt::Display,
{
    let mut retries_left = policy.max_retries;
    let mut delay = policy.initial_delay();
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries_left > 0 && err.is_rate_limited() => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_retries + 1,
                    wait_ms = delay.as_millis() as u64,
                    error = %err,
                    "with_retry: rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                retries_left -= 1;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
