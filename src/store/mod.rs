//! Result Store Adapter
//!
//! [`ResultStore`] is the one handle the pipeline and the HTTP layer use for
//! persistence. It fronts three independent backends:
//!
//! - a TTL cache tier holding confirmed-phishing verdicts ([`CacheTier`])
//! - the latest-wins detection log ([`DetectionStore`])
//! - append-only user feedback documents ([`FeedbackStore`])
//!
//! The adapter keeps no request state. It is built once at startup and
//! shared by cloning.

mod cache;
mod database;
mod detections;
mod errors;
mod feedback;
mod types;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

pub use cache::{CacheTier, MemoryCacheTier};
pub use database::connect;
pub use detections::{DetectionStore, SqliteDetectionStore};
pub use errors::{StoreError, StoreResult};
pub use feedback::{FeedbackStore, SqliteFeedbackStore};
pub use types::{CacheEntry, DetectionRecord, FeedbackRecord, NewDetection, NewFeedback};

use crate::config::StoreConfig;
use crate::utils::cache_key;

#[derive(Clone)]
pub struct ResultStore {
    cache: Arc<dyn CacheTier>,
    detections: Arc<dyn DetectionStore>,
    feedback: Arc<dyn FeedbackStore>,
    pool: Option<SqlitePool>,
}

impl ResultStore {
    pub fn new(
        cache: Arc<dyn CacheTier>,
        detections: Arc<dyn DetectionStore>,
        feedback: Arc<dyn FeedbackStore>,
    ) -> Self {
        Self {
            cache,
            detections,
            feedback,
            pool: None,
        }
    }

    /// Open the SQLite-backed stores over one shared pool.
    ///
    /// # Errors
    ///
    /// `StoreError::Unavailable` when the database cannot be opened.
    pub async fn connect(config: &StoreConfig, cache: Arc<dyn CacheTier>) -> StoreResult<Self> {
        let pool = database::connect(config).await?;
        Ok(Self {
            cache,
            detections: Arc::new(SqliteDetectionStore::new(pool.clone())),
            feedback: Arc::new(SqliteFeedbackStore::new(pool.clone())),
            pool: Some(pool),
        })
    }

    /// Cached verdict for `url`. Absence means "not cached", never "benign".
    pub async fn get_cached_result(&self, url: &str) -> StoreResult<Option<CacheEntry>> {
        match self.cache.get(&cache_key(url)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write a verdict into the cache tier for `ttl`.
    ///
    /// Callers only pass phishing verdicts; the tier is a phishing-only index.
    pub async fn cache_phishing_result(
        &self,
        url: &str,
        is_phishing: bool,
        confidence: f64,
        ttl: Duration,
    ) -> StoreResult<()> {
        let entry = CacheEntry {
            url: url.to_string(),
            is_phishing,
            confidence,
            last_updated: Utc::now(),
        };
        self.cache
            .set_ex(&cache_key(url), serde_json::to_string(&entry)?, ttl)
            .await?;
        debug!(url, ttl_secs = ttl.as_secs(), "Cached verdict");
        Ok(())
    }

    pub async fn save_detection(&self, detection: NewDetection) -> StoreResult<DetectionRecord> {
        self.detections.upsert(detection).await
    }

    pub async fn recent_detections(&self, limit: u32, offset: u32) -> StoreResult<Vec<DetectionRecord>> {
        self.detections.recent(limit, offset).await
    }

    pub async fn recent_phishing(&self, limit: u32) -> StoreResult<Vec<DetectionRecord>> {
        self.detections.recent_phishing(limit).await
    }

    pub async fn count_detections(&self) -> StoreResult<i64> {
        self.detections.count().await
    }

    /// Returns the generated feedback id
    pub async fn save_feedback(&self, feedback: NewFeedback) -> StoreResult<String> {
        self.feedback.append(feedback).await
    }

    pub async fn recent_feedback(&self, limit: u32) -> StoreResult<Vec<FeedbackRecord>> {
        self.feedback.recent(limit).await
    }

    /// Readiness check across all three stores
    pub async fn ping(&self) -> StoreResult<()> {
        self.cache.ping().await?;
        self.detections.ping().await?;
        self.feedback.ping().await
    }

    /// Close the shared database pool, if this store owns one
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("Result database closed");
        }
    }
}
