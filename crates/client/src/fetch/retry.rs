//! Retry with exponential backoff for transient provider failures.
//!
//! Rate-limit responses (429), server errors (5xx), timeouts and connection
//! failures are retried. A `Retry-After` header on the failed response raises
//! the wait for that attempt. Everything else fails immediately.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use super::FetchError;

/// Classification of errors for retry purposes.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried.
    fn is_retryable(&self) -> bool;

    /// Minimum wait requested by the remote side before retrying.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            FetchError::Timeout => true,
            FetchError::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            FetchError::InvalidUrl(_) | FetchError::TooLarge { .. } => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        FetchError::retry_after(self)
    }
}

/// Retry policy for provider requests.
///
/// `max_backoff` caps the computed backoff only. A server `Retry-After` is
/// always waited out in full.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_backoff: Duration::from_secs(1), max_backoff: Duration::from_secs(30), jitter: true }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Default::default() }
    }
}

/// Run `operation`, retrying retryable failures according to `policy`.
///
/// Returns the first success, or the last error once retries are exhausted.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = policy.base_backoff;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(attempts = attempt + 1, "request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;

                let jittered = if policy.jitter { add_jitter(delay) } else { delay };
                let backoff = jittered.min(policy.max_backoff);
                let wait = e.retry_after().map_or(backoff, |after| after.max(backoff));

                tracing::warn!(
                    error = %e,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = wait.as_millis() as u64,
                    "request failed, retrying"
                );

                tokio::time::sleep(wait).await;
                delay = (delay * 2).min(policy.max_backoff);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Jitter uniformly between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + factor))
}
