//! Retry for transient SQLite lock errors
//!
//! Writes from concurrent requests can still collide past `busy_timeout`;
//! those are retried with exponential backoff (10ms doubling, capped at 1s)
//! until the wait budget runs out. Any other error fails immediately.

use concierge_common::{Error, Result};
use std::time::{Duration, Instant};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// True for "database is locked" / "database is busy" failures
pub fn is_lock_error(err: &Error) -> bool {
    match err {
        Error::Database(db_err) => {
            let message = db_err.to_string();
            message.contains("database is locked") || message.contains("database is busy")
        }
        _ => false,
    }
}

/// Run `operation` until it succeeds, fails with a non-lock error, or
/// `max_wait_ms` has elapsed.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !is_lock_error(&err) => return Err(err),
            Err(_) => {
                let elapsed = start_time.elapsed();

                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        max_wait_ms,
                        "Database operation failed: max retry time exceeded"
                    );
                    return Err(Error::Internal(format!(
                        "Database locked after {} attempts ({} ms elapsed, max {} ms)",
                        attempt,
                        elapsed.as_millis(),
                        max_wait_ms
                    )));
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    "Database locked, will retry after backoff"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn locked() -> Error {
        Error::Database(sqlx::Error::Protocol("database is locked".to_string()))
    }

    #[test]
    fn test_lock_detection() {
        assert!(is_lock_error(&locked()));
        assert!(!is_lock_error(&Error::Internal("database is locked".to_string())));
        assert!(!is_lock_error(&Error::Database(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = retry_on_lock("test_op", 5000, || async { Ok::<i32, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_succeeds_after_lock_errors() {
        let attempts = AtomicU32::new(0);

        let result = retry_on_lock("test_op", 5000, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(locked())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let result = retry_on_lock("test_op", 30, || async { Err::<i32, Error>(locked()) }).await;

        match result {
            Err(Error::Internal(message)) => assert!(message.contains("Database locked")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_lock_error_fails_immediately() {
        let attempts = AtomicU32::new(0);

        let result = retry_on_lock("test_op", 5000, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, Error>(Error::Internal("other error".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
