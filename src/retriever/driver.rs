//! Browser-driver seam
//!
//! The retriever only needs three things from a browser: go somewhere, hand
//! back the serialized DOM, and shut down. [`PageDriver`] captures exactly
//! that so the retry engine can be exercised without a real Chromium.
//!
//! Drivers are single-owner. A [`DriverGuard`] wraps each one for the span of
//! a single attempt and guarantees teardown on every exit path:
//! - explicit [`DriverGuard::release`] on success and failure
//! - a spawned close from `Drop` when the owning future is abandoned

use async_trait::async_trait;
use tracing::{debug, warn};

use super::errors::{DriverError, DriverResult};

/// One live browser session
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to `url` and wait for the load to finish
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Serialized DOM of the current page
    async fn page_source(&mut self) -> DriverResult<String>;

    /// Tear the session down. Must be safe to call more than once.
    async fn close(&mut self) -> DriverResult<()>;
}

/// Factory for fresh driver sessions
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    async fn launch(&self) -> DriverResult<Box<dyn PageDriver>>;
}

/// Scoped ownership of a driver for one attempt
pub struct DriverGuard {
    driver: Option<Box<dyn PageDriver>>,
    label: String,
}

impl DriverGuard {
    pub fn new(driver: Box<dyn PageDriver>, label: impl Into<String>) -> Self {
        Self {
            driver: Some(driver),
            label: label.into(),
        }
    }

    /// Borrow the live driver
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Released`] after [`release`](Self::release).
    pub fn driver(&mut self) -> DriverResult<&mut (dyn PageDriver + 'static)> {
        self.driver.as_deref_mut().ok_or(DriverError::Released)
    }

    /// Close the driver now. Close failures are logged and swallowed.
    pub async fn release(mut self) {
        if let Some(mut driver) = self.driver.take() {
            close_quietly(driver.as_mut(), &self.label).await;
        }
    }
}

impl Drop for DriverGuard {
    fn drop(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            return;
        };

        let label = std::mem::take(&mut self.label);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(session = %label, "driver guard dropped while live, closing in background");
                handle.spawn(async move {
                    close_quietly(driver.as_mut(), &label).await;
                });
            }
            Err(_) => {
                warn!(session = %label, "driver guard dropped outside a runtime, driver not closed");
            }
        }
    }
}

async fn close_quietly(driver: &mut dyn PageDriver, label: &str) {
    if let Err(e) = driver.close().await {
        warn!(session = %label, error = %e, "driver teardown failed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    struct CountingDriver {
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl PageDriver for CountingDriver {
        async fn navigate(&mut self, _url: &str) -> DriverResult<()> {
            Ok(())
        }

        async fn page_source(&mut self) -> DriverResult<String> {
            Ok("<html></html>".into())
        }

        async fn close(&mut self) -> DriverResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                Err(DriverError::Close("already gone".into()))
            } else {
                Ok(())
            }
        }
    }

    fn guard(closes: &Arc<AtomicUsize>, fail_close: bool) -> DriverGuard {
        DriverGuard::new(
            Box::new(CountingDriver {
                closes: Arc::clone(closes),
                fail_close,
            }),
            "test",
        )
    }

    #[tokio::test]
    async fn test_release_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let g = guard(&closes, false);
        g.release().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_release_swallows_close_error() {
        let closes = Arc::new(AtomicUsize::new(0));
        guard(&closes, true).release().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_spawns_close() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut g = guard(&closes, false);
        g.driver().expect("live driver").navigate("https://www.example.com/").await.ok();
        drop(g);

        for _ in 0..50 {
            if closes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
