//! Timeout wrapper for driver operations

use std::future::Future;
use std::time::Duration;

use super::errors::{DriverError, DriverResult};

/// Run a driver operation under a hard deadline.
///
/// An elapsed deadline becomes [`DriverError::Timeout`] carrying
/// `operation_name`; errors from the operation itself pass through.
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &'static str,
) -> DriverResult<T>
where
    F: Future<Output = DriverResult<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout {
            operation: operation_name,
            after: timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_elapsed_operation_is_timeout() {
        let result: DriverResult<()> = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Duration::from_millis(20),
            "page load",
        )
        .await;

        let err = result.expect_err("operation should time out");
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("page load timeout after"));
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: DriverResult<()> = with_page_timeout(
            async { Err(DriverError::Navigation("net::ERR_NAME_NOT_RESOLVED".into())) },
            Duration::from_secs(1),
            "page load",
        )
        .await;

        assert!(matches!(result, Err(DriverError::Navigation(_))));
    }
}
