use crate::cancel::CancellationState;
use crate::{Result, SorterError};
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay for exponential backoff (in seconds)
    pub base_delay: u64,
    /// Maximum delay cap (in seconds)
    pub max_delay: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: 1,
            max_delay: 120,
        }
    }
}

impl RetryConfig {
    /// Fail on the first rate limit.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Result of a retry operation with context
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The successful result
    pub result: T,
    /// Number of retry attempts made
    pub attempts_made: u32,
    /// Total time spent waiting (in seconds)
    pub total_retry_time: u64,
}

/// Delay before retry number `retries` (0-based) given the server's hint.
pub fn backoff_delay(config: &RetryConfig, retries: u32, retry_after: u64) -> u64 {
    let base_backoff = config
        .base_delay
        .saturating_mul(2_u64.saturating_pow(retries));
    std::cmp::min(retry_after.saturating_add(base_backoff), config.max_delay)
}

/// Execute an async operation, retrying when it reports a rate limit.
///
/// Only [`SorterError::RateLimit`] is retried; every other error is returned
/// as-is. Waits honour `cancel`, so a cancelled run stops mid-backoff.
///
/// # Arguments
/// * `config` - Retry configuration
/// * `cancel` - Cancellation state checked during each wait
/// * `operation_name` - Name of the operation for logging
/// * `operation` - Async function that returns a Result
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationState,
    operation_name: &str,
    mut operation: F,
) -> Result<RetryResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    let mut total_retry_time = 0;

    loop {
        match operation().await {
            Ok(result) => {
                return Ok(RetryResult {
                    result,
                    attempts_made: retries,
                    total_retry_time,
                });
            }
            Err(SorterError::RateLimit { retry_after }) => {
                if retries >= config.max_retries {
                    log::warn!(
                        "Max retries ({}) exceeded for {} operation",
                        config.max_retries,
                        operation_name
                    );
                    return Err(SorterError::RateLimit { retry_after });
                }

                let delay = backoff_delay(config, retries, retry_after);
                log::info!(
                    "{} rate limited. Waiting {} seconds before retry {} of {}",
                    operation_name,
                    delay,
                    retries + 1,
                    config.max_retries
                );

                cancel.sleep(Duration::from_secs(delay)).await?;
                retries += 1;
                total_retry_time += delay;
            }
            Err(other_error) => {
                return Err(other_error);
            }
        }
    }
}
