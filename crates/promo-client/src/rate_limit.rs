//! Retry utilities for mall API requests.
//!
//! Only HTTP 429 is retried. Every other failure (network errors, other
//! non-2xx statuses, undecodable bodies) is returned to the caller on the
//! first occurrence.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// Returns `true` if `err` should be retried after a backoff delay.
pub(crate) fn is_retriable(err: &ClientError) -> bool {
    matches!(err, ClientError::RateLimited { .. })
}

/// Executes `operation`, retrying on HTTP 429 with exponential backoff.
///
/// The wait before the n-th retry is `backoff_base_ms * 2^(n-1)`, so with the
/// defaults (`max_retries = 3`, `backoff_base_ms = 1000`) a request that is
/// rate limited three times sleeps 1 s, 2 s and 4 s before its fourth and
/// final attempt. The delay only holds up this one request.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }

                let delay_ms = backoff_base_ms.saturating_mul(1u64 << attempt.min(62));
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "rate limited, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}
