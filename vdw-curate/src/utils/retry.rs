//! Bounded retry for transient failures
//!
//! Retries an async operation while its error classifies itself as
//! transient, up to `max_attempts`, sleeping a fixed delay between
//! attempts. Permanent errors fail immediately.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that know whether a retry could help
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Attempt budget and inter-attempt delay for one kind of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (minimum 1)
    pub max_attempts: u32,
    /// Sleep between a failed attempt and the next one
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Final failure of a retried operation
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a transient error
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last: E,
    },

    /// A non-transient error ended the retry loop
    #[error("{operation} failed permanently on attempt {attempt}: {error}")]
    Permanent {
        operation: String,
        attempt: u32,
        error: E,
    },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Permanent { attempt, .. } => *attempt,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Permanent { error, .. } => error,
        }
    }
}

/// Run `operation` under `policy`
///
/// The closure receives the 1-based attempt number. Any cleanup of partial
/// state is the operation's job before it returns its error.
pub async fn retry_transient<F, Fut, T, E>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) if !error.is_transient() => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    error = %error,
                    "Permanent failure, not retrying"
                );
                return Err(RetryError::Permanent {
                    operation: operation_name.to_string(),
                    attempt,
                    error,
                });
            }
            Err(error) if attempt >= max_attempts => {
                tracing::error!(
                    operation = operation_name,
                    attempt,
                    error = %error,
                    "Retry budget exhausted"
                );
                return Err(RetryError::Exhausted {
                    operation: operation_name.to_string(),
                    attempts: attempt,
                    last: error,
                });
            }
            Err(error) => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %error,
                    "Transient failure, will retry after delay"
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
}
