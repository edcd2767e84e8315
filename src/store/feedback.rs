//! Append-only feedback documents

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::detections::from_millis;
use super::errors::StoreResult;
use super::types::{FeedbackRecord, NewFeedback};

/// Insert-only document collection of user feedback
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Store one submission and return its generated id
    async fn append(&self, feedback: NewFeedback) -> StoreResult<String>;

    /// Most recent submissions first
    async fn recent(&self, limit: u32) -> StoreResult<Vec<FeedbackRecord>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// `user_feedback` table; each row holds one JSON document
#[derive(Clone)]
pub struct SqliteFeedbackStore {
    pool: SqlitePool,
}

impl SqliteFeedbackStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackStore for SqliteFeedbackStore {
    async fn append(&self, feedback: NewFeedback) -> StoreResult<String> {
        let feedback_id = Uuid::new_v4().to_string();
        let document = serde_json::to_string(&feedback)?;

        sqlx::query("INSERT INTO user_feedback (id, document, feedback_time) VALUES (?, ?, ?)")
            .bind(&feedback_id)
            .bind(document)
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(feedback_id)
    }

    async fn recent(&self, limit: u32) -> StoreResult<Vec<FeedbackRecord>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT id, document, feedback_time FROM user_feedback \
             ORDER BY feedback_time DESC, rowid DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(feedback_id, document, feedback_time)| -> StoreResult<FeedbackRecord> {
                Ok(FeedbackRecord {
                    feedback_id,
                    feedback: serde_json::from_str(&document)?,
                    feedback_time: from_millis(feedback_time)?,
                })
            })
            .collect()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::StoreConfig;
    use crate::store::database;

    fn feedback(url: &str, comment: Option<&str>) -> NewFeedback {
        NewFeedback {
            url: url.into(),
            is_correct: false,
            detected_result: true,
            confidence: 0.73,
            user_comment: comment.map(str::to_string),
            metadata: Some(json!({"client": "android"})),
        }
    }

    #[tokio::test]
    async fn test_append_assigns_distinct_ids_and_lists_newest_first() {
        let pool = database::connect(&StoreConfig::in_memory())
            .await
            .expect("in-memory database");
        let store = SqliteFeedbackStore::new(pool);

        let first = store
            .append(feedback("https://www.a.com/", None))
            .await
            .expect("append");
        let second = store
            .append(feedback("https://www.b.com/", Some("this is my bank")))
            .await
            .expect("append");
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());

        let recent = store.recent(10).await.expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].feedback_id, second);
        assert_eq!(recent[0].feedback.user_comment.as_deref(), Some("this is my bank"));
        assert_eq!(recent[1].feedback.metadata, Some(json!({"client": "android"})));

        assert_eq!(store.recent(1).await.expect("recent").len(), 1);
    }
}
