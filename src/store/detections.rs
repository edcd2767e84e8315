//! Relational detection log

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::errors::{StoreError, StoreResult};
use super::types::{DetectionRecord, NewDetection};

/// Latest-wins classification log, one row per URL
#[async_trait]
pub trait DetectionStore: Send + Sync {
    /// Insert or overwrite the row for `detection.url`, bumping its time
    async fn upsert(&self, detection: NewDetection) -> StoreResult<DetectionRecord>;

    /// Rows ordered by detection time, newest first
    async fn recent(&self, limit: u32, offset: u32) -> StoreResult<Vec<DetectionRecord>>;

    /// Phishing rows only, newest first
    async fn recent_phishing(&self, limit: u32) -> StoreResult<Vec<DetectionRecord>>;

    async fn count(&self) -> StoreResult<i64>;

    async fn ping(&self) -> StoreResult<()>;
}

type DetectionRow = (i64, String, bool, f64, i64, Option<String>, Option<String>);

const COLUMNS: &str = "id, url, is_phishing, confidence, detection_time, html_content, features";

/// `phishing_urls` table
#[derive(Clone)]
pub struct SqliteDetectionStore {
    pool: SqlitePool,
}

impl SqliteDetectionStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DetectionStore for SqliteDetectionStore {
    async fn upsert(&self, detection: NewDetection) -> StoreResult<DetectionRecord> {
        let features = detection
            .features
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let now = Utc::now().timestamp_millis();

        let sql = format!(
            r#"
            INSERT INTO phishing_urls (url, is_phishing, confidence, detection_time, html_content, features)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                is_phishing = excluded.is_phishing,
                confidence = excluded.confidence,
                detection_time = MAX(excluded.detection_time, phishing_urls.detection_time + 1),
                html_content = COALESCE(excluded.html_content, phishing_urls.html_content),
                features = COALESCE(excluded.features, phishing_urls.features)
            RETURNING {COLUMNS}
            "#
        );

        let row: DetectionRow = sqlx::query_as(&sql)
            .bind(&detection.url)
            .bind(detection.is_phishing)
            .bind(detection.confidence)
            .bind(now)
            .bind(&detection.html_content)
            .bind(features)
            .fetch_one(&self.pool)
            .await?;

        into_record(row)
    }

    async fn recent(&self, limit: u32, offset: u32) -> StoreResult<Vec<DetectionRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM phishing_urls ORDER BY detection_time DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows: Vec<DetectionRow> = sqlx::query_as(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_record).collect()
    }

    async fn recent_phishing(&self, limit: u32) -> StoreResult<Vec<DetectionRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM phishing_urls WHERE is_phishing = 1 \
             ORDER BY detection_time DESC, id DESC LIMIT ?"
        );
        let rows: Vec<DetectionRow> = sqlx::query_as(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_record).collect()
    }

    async fn count(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM phishing_urls")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn into_record(row: DetectionRow) -> StoreResult<DetectionRecord> {
    let (id, url, is_phishing, confidence, detection_time, html_content, features) = row;
    Ok(DetectionRecord {
        id,
        url,
        is_phishing,
        confidence,
        detection_time: from_millis(detection_time)?,
        html_content,
        features: features.as_deref().map(serde_json::from_str).transpose()?,
    })
}

pub(super) fn from_millis(millis: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Unavailable(format!("stored timestamp {millis} is out of range")))
}
