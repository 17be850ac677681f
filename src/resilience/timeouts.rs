//! Timeout enforcement.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The operation did not finish before its deadline and was cancelled.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("operation '{operation}' exceeded its {deadline:?} deadline")]
pub struct DeadlineExceeded {
    pub operation: String,
    pub deadline: Duration,
}

/// Await `fut` for at most `deadline`. On expiry the future is dropped.
pub async fn with_deadline<F: Future>(
    operation: &str,
    deadline: Duration,
    fut: F,
) -> Result<F::Output, DeadlineExceeded> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(output) => Ok(output),
        Err(_) => {
            tracing::warn!(operation = %operation, deadline = ?deadline, "Deadline exceeded, operation cancelled");
            Err(DeadlineExceeded {
                operation: operation.to_string(),
                deadline,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let err = with_deadline("slow", Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
        })
        .await
        .unwrap_err();

        assert_eq!(err.operation, "slow");
        assert_eq!(err.to_string(), "operation 'slow' exceeded its 50ms deadline");
    }

    #[tokio::test]
    async fn test_fast_operation_passes_through() {
        let out = with_deadline("fast", Duration::from_secs(1), async { 5 }).await;
        assert_eq!(out, Ok(5));
    }
}
