//! Fixed-delay retry policy shared by chunk uploads and hash lookups.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{Result, UploadError};

/// Retry settings for one call site.
///
/// `max_attempts` counts every try, including the first. The delay between
/// attempts is constant. Only errors accepted by `retry_on` are retried; any
/// other error is returned immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts allowed (values below 1 are treated as 1).
    pub max_attempts: u32,
    /// Sleep between consecutive attempts.
    pub delay: Duration,
    /// Which failures are worth another attempt.
    pub retry_on: fn(&UploadError) -> bool,
}

/// Final result of a retried operation plus the attempts it consumed.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_attempts: u32, delay: Duration, retry_on: fn(&UploadError) -> bool) -> Self {
        Self {
            max_attempts,
            delay,
            retry_on,
        }
    }

    /// Policy for chunk transfers: retries `ChunkUpload` failures only.
    pub fn for_chunks(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, delay, UploadError::is_chunk_failure)
    }

    /// Policy for remote hash lookups: retries `HashFetch` failures only.
    pub fn for_hash_fetch(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, delay, UploadError::is_hash_fetch)
    }

    fn attempts_allowed(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, runs out
    /// of attempts, or `cancel` is raised.
    ///
    /// Cancellation is only checked before an attempt starts, so an attempt
    /// already in flight always runs to completion.
    pub async fn run<T, F, Fut>(&self, label: &str, cancel: &CancelToken, mut op: F) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let allowed = self.attempts_allowed();
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return Attempted {
                    result: Err(UploadError::Cancelled),
                    attempts,
                };
            }

            attempts += 1;
            let err = match op(attempts).await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts,
                    };
                }
                Err(err) => err,
            };

            if !(self.retry_on)(&err) {
                debug!("{}: attempt {} failed with non-retryable error: {}", label, attempts, err);
                return Attempted {
                    result: Err(err),
                    attempts,
                };
            }

            if attempts >= allowed {
                warn!("{}: giving up after {} attempts: {}", label, attempts, err);
                return Attempted {
                    result: Err(err),
                    attempts,
                };
            }

            warn!("{}: attempt {}/{} failed: {}", label, attempts, allowed, err);
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn chunk_err() -> UploadError {
        UploadError::ChunkUpload {
            start: 0,
            end: 9,
            status: Some(503),
            message: "unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::for_chunks(3, Duration::ZERO);
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let outcome = policy
            .run("test", &CancelToken::new(), move |_| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(chunk_err())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(outcome.result.unwrap(), 7);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let policy = RetryPolicy::for_chunks(4, Duration::ZERO);
        let outcome: Attempted<()> = policy
            .run("test", &CancelToken::new(), |_| async { Err(chunk_err()) })
            .await;

        assert!(matches!(outcome.result, Err(UploadError::ChunkUpload { .. })));
        assert_eq!(outcome.attempts, 4);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_swallowed() {
        let policy = RetryPolicy::for_chunks(5, Duration::ZERO);
        let outcome: Attempted<()> = policy
            .run("test", &CancelToken::new(), |_| async {
                Err(UploadError::InvalidResponse {
                    operation: "upload chunk",
                    message: "garbage".to_string(),
                })
            })
            .await;

        assert!(matches!(outcome.result, Err(UploadError::InvalidResponse { .. })));
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::for_hash_fetch(0, Duration::ZERO);
        let outcome = policy
            .run("test", &CancelToken::new(), |_| async { Ok("hash") })
            .await;
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let policy = RetryPolicy::for_chunks(3, Duration::ZERO);
        let outcome: Attempted<()> = policy.run("test", &cancel, |_| async { Ok(()) }).await;

        assert!(matches!(outcome.result, Err(UploadError::Cancelled)));
        assert_eq!(outcome.attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts() {
        let policy = RetryPolicy::for_chunks(3, Duration::from_secs(5));
        let start = tokio::time::Instant::now();

        let outcome: Attempted<()> = policy
            .run("test", &CancelToken::new(), |_| async { Err(chunk_err()) })
            .await;

        assert_eq!(outcome.attempts, 3);
        // Two sleeps between three attempts, none after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }
}
