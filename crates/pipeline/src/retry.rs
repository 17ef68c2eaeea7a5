//! Bounded retry with exponential backoff for mesh service calls.
//!
//! Only transient failures (timeouts, transport errors) are retried;
//! a semantic rejection by the service fails immediately. The backoff
//! delay doubles after each failed attempt up to a ceiling.

use std::future::Future;
use std::time::Duration;

/// Tunable parameters for the retry policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first (so 3 means 2 retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Run `operation` until it succeeds, a permanent error occurs, or
/// `max_attempts` is exhausted.
///
/// `is_transient` decides whether an error is worth another attempt.
/// The last error is returned on exhaustion.
pub async fn with_retry<T, E, F, Fut, P>(
    config: &RetryConfig,
    is_transient: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let attempts = config.max_attempts.max(1);

    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && is_transient(&e) => {
                tracing::warn!(
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying",
                );
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, config);
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("loop returns on the final attempt")
}
