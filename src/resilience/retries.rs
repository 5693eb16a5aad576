//! Retry logic.
//!
//! # Responsibilities
//! - Run a fallible async operation up to `max_attempts` times
//! - Sleep with exponential backoff + jitter between attempts
//! - Surface the attempt count and the last error on exhaustion
//!
//! # Design Decisions
//! - No sleep after the final attempt
//! - Zero `max_attempts` is treated as one attempt

use std::fmt::Display;
use std::future::Future;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// All attempts failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `operation` until it succeeds or `config.max_attempts` is reached.
///
/// The closure receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: &RetryConfig,
    name: &str,
    mut operation: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation = name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                let delay = calculate_backoff(attempt, config.base_delay, config.max_delay);
                tracing::warn!(
                    operation = name,
                    attempt,
                    max_attempts,
                    delay = ?delay,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(
                    operation = name,
                    attempts = attempt,
                    error = %e,
                    "Giving up after final attempt"
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
        }
    }
}
