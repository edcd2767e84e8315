//! Records exchanged with the backing stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cached phishing verdict, stored as JSON under `phishing:<url>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub is_phishing: bool,
    pub confidence: f64,
    pub last_updated: DateTime<Utc>,
}

/// Latest classification of one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: i64,
    pub url: String,
    pub is_phishing: bool,
    pub confidence: f64,
    pub detection_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Value>,
}

/// Input to a detection upsert
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewDetection {
    pub url: String,
    pub is_phishing: bool,
    pub confidence: f64,
    /// `None` keeps whatever snapshot is already stored
    pub html_content: Option<String>,
    /// `None` keeps whatever features are already stored
    pub features: Option<Value>,
}

/// A user's correction or comment on a past verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeedback {
    pub url: String,
    pub is_correct: bool,
    pub detected_result: bool,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Feedback document as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub feedback_id: String,
    #[serde(flatten)]
    pub feedback: NewFeedback,
    pub feedback_time: DateTime<Utc>,
}
