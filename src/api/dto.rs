//! Request and response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::{AnalysisResult, ResultSource};
use crate::store::DetectionRecord;

/// Envelope around every response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub timestamp: String,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_message("SUCCESS", data)
    }

    pub fn error(data: T) -> Self {
        Self::with_message("ERROR", data)
    }

    fn with_message(message: &str, data: T) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            message: message.to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: bool,
    pub confidence: f64,
    pub source: ResultSource,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(r: AnalysisResult) -> Self {
        Self {
            result: r.is_phishing,
            confidence: r.confidence,
            source: r.source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub url: String,
    pub is_correct: bool,
    #[serde(default)]
    pub comment: Option<String>,
    pub detected_result: bool,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_recent_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

/// Detection row without the page snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub id: i64,
    pub url: String,
    pub is_phishing: bool,
    pub confidence: f64,
    pub detection_time: DateTime<Utc>,
}

impl From<DetectionRecord> for DetectionSummary {
    fn from(r: DetectionRecord) -> Self {
        Self {
            id: r.id,
            url: r.url,
            is_phishing: r.is_phishing,
            confidence: r.confidence,
            detection_time: r.detection_time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecentResponse {
    pub urls: Vec<DetectionSummary>,
    pub total: i64,
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheUpdateResponse {
    pub status: String,
    pub limit: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub model: String,
}
