//! Request and result types of the decision pipeline

use serde::{Deserialize, Serialize};

/// One URL to classify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub url: String,
}

/// Which stage produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Whitelist,
    Cache,
    Model,
    /// Scoring failed; the verdict is a labeled fail-open default
    Error,
}

impl ResultSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Cache => "cache",
            Self::Model => "model",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final answer for one request. Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub is_phishing: bool,
    pub confidence: f64,
    pub source: ResultSource,
}

impl AnalysisResult {
    #[must_use]
    pub fn new(is_phishing: bool, confidence: f64, source: ResultSource) -> Self {
        Self {
            is_phishing,
            confidence,
            source,
        }
    }

    /// Fail-open result for an input the scorer could not score
    #[must_use]
    pub fn scoring_failed() -> Self {
        Self::new(false, 0.0, ResultSource::Error)
    }
}
