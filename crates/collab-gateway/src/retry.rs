//! Exponential back-off for the proxied services.
//!
//! [`retry_with_backoff`] wraps one outbound call. Rate limiting (HTTP 429)
//! waits `base × 2^(attempt+1)`, network failures wait `base × 2^attempt`.
//! Everything else, including the out-of-credits signal, returns at once.

use std::future::Future;
use std::time::Duration;

use crate::error::GatewayError;

/// Attempt budget and delay unit shared by all transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1_000,
        }
    }
}

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Only transport-level failures and rate limiting qualify. Upstream error
/// statuses are handed back to the caller untouched.
pub(crate) fn is_retriable(err: &GatewayError) -> bool {
    match err {
        GatewayError::Http(_) | GatewayError::RateLimited { .. } => true,
        GatewayError::RequestFailed { .. }
        | GatewayError::Upstream { .. }
        | GatewayError::OutOfCredits
        | GatewayError::Deserialize { .. }
        | GatewayError::InvalidUrl { .. } => false,
    }
}

/// Delay before the attempt following `attempt` (zero-based).
pub(crate) fn backoff_delay_ms(err: &GatewayError, attempt: u32, base_ms: u64) -> u64 {
    let exponent = match err {
        GatewayError::RateLimited { .. } => attempt + 1,
        _ => attempt,
    };
    base_ms.saturating_mul(1u64 << exponent.min(16))
}

/// Runs `operation` up to `policy.max_retries` times while it fails with a
/// retriable error. No sleep follows the final attempt.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-retriable error. A run that ends on 429 reports
/// [`GatewayError::RateLimited`] with the number of attempts made.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let max_retries = policy.max_retries.max(1);
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let exhausted = attempt + 1 >= max_retries;
                if !is_retriable(&err) || exhausted {
                    return Err(match err {
                        GatewayError::RateLimited { .. } => GatewayError::RateLimited {
                            attempts: attempt + 1,
                        },
                        other => other,
                    });
                }
                let delay_ms = backoff_delay_ms(&err, attempt, policy.backoff_base_ms);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient upstream error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}
