//! Cache refresh job
//!
//! Republishes the most recent phishing detections into the cache tier. The
//! job reads the detection log and writes the cache; it never deletes, so
//! re-running it over the same log yields the same cache contents.

use tracing::{info, warn};

use super::analyzer::DecisionPipeline;
use crate::runtime::RefreshRequest;
use crate::store::StoreResult;

impl DecisionPipeline {
    /// Cache the `limit` newest phishing detections; returns how many were
    /// written.
    ///
    /// A failed write is logged and skipped.
    ///
    /// # Errors
    ///
    /// `StoreError` when the detection log cannot be read.
    pub async fn refresh_cache(&self, limit: u32) -> StoreResult<usize> {
        let records = self.store.recent_phishing(limit).await?;
        let ttl = self.config.cache_ttl();

        let mut cached = 0;
        for record in &records {
            match self
                .store
                .cache_phishing_result(&record.url, record.is_phishing, record.confidence, ttl)
                .await
            {
                Ok(()) => cached += 1,
                Err(e) => warn!(url = %record.url, error = %e, "Failed to refresh cache entry"),
            }
        }

        info!(limit, found = records.len(), cached, "Cache refresh finished");
        Ok(cached)
    }

    /// Run [`refresh_cache`](Self::refresh_cache) on a background task.
    ///
    /// Returns immediately; await the handle for the count or drop it to let
    /// the job run detached.
    pub fn spawn_refresh(&self, limit: u32) -> RefreshRequest {
        let pipeline = self.clone();
        RefreshRequest::spawn(async move {
            let result = pipeline.refresh_cache(limit).await;
            if let Err(e) = &result {
                warn!(error = %e, "Cache refresh failed");
            }
            result
        })
    }
}
