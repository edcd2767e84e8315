//! Awaitable wrappers for work spawned onto the runtime.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::store::{StoreError, StoreResult};

/// Pending background cache refresh.
///
/// The refresh runs on its own task whether or not this handle is awaited;
/// dropping the handle only discards the outcome.
pub struct RefreshRequest {
    receiver: oneshot::Receiver<StoreResult<usize>>,
}

impl RefreshRequest {
    /// Create a new `RefreshRequest` from a oneshot receiver
    #[must_use]
    pub fn new(receiver: oneshot::Receiver<StoreResult<usize>>) -> Self {
        Self { receiver }
    }

    /// Spawn `task` and return a handle to its result
    pub fn spawn<F>(task: F) -> Self
    where
        F: Future<Output = StoreResult<usize>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = task.await;
            // receiver may already be gone: fire-and-forget callers
            let _ = tx.send(result);
        });

        Self::new(rx)
    }
}

/// Implement Future so callers that do care can simply .await the refresh
impl Future for RefreshRequest {
    type Output = StoreResult<usize>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(StoreError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
