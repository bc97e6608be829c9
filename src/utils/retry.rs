//! Bounded retry with fixed backoff for transient backend failures.
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If the error matches the retryable predicate and attempts remain:
//!    sleep the fixed delay, retry
//! 4. If the error does not match: return it immediately (no retry)
//! 5. After max attempts: return an error naming the attempt count and the
//!    last underlying error
//!
//! Stateless across invocations; each call owns its own attempt counter.

use crate::config::RetryPolicy;
use crate::types::BackendError;

/// Retry an async operation under the given policy.
///
/// `is_retryable` gates which error class is considered transient; in this
/// service that is exactly [`BackendError::is_timeout`].
///
/// # Arguments
/// * `operation_name` - Name for logging and the exhaustion error
/// * `policy` - Attempt bound and fixed inter-attempt delay
/// * `is_retryable` - Transient-failure predicate
/// * `operation` - Async closure performing the call
pub async fn with_retry<F, Fut, T, P>(
    operation_name: &str,
    policy: RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, BackendError>>,
    P: Fn(&BackendError) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error: Option<BackendError> = None;

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            tracing::debug!(
                operation = operation_name,
                attempt,
                "Retrying backend operation"
            );
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Backend operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    // Permanent error, fail immediately
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    "Transient backend failure"
                );
                last_error = Some(err);

                if attempt < max_attempts {
                    tokio::time::sleep(policy.delay()).await;
                }
            }
        }
    }

    let last = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error".to_string());

    tracing::error!(
        operation = operation_name,
        attempts = max_attempts,
        last_error = %last,
        "Backend operation failed: retries exhausted"
    );

    Err(BackendError::RetryExhausted {
        operation: operation_name.to_string(),
        attempts: max_attempts,
        last,
    })
}
