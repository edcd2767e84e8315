//! Configuration types for the detection service
//!
//! Durations are stored as integer seconds or milliseconds, the way they
//! appear in environment variables, with accessor methods returning
//! [`Duration`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retriever::NormalizationPolicy;
use crate::utils::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_BACKOFF_JITTER_MS, DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_RETRIES,
    DEFAULT_MAX_LENGTH, DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_PHISHING_THRESHOLD,
    DEFAULT_REFRESH_LIMIT, DEFAULT_SETTLE_DELAY_MS, WHITELIST_CONFIDENCE, WHITELIST_DELAY_MS,
};

/// Everything the service needs at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub retriever: RetrieverConfig,
    pub pipeline: PipelineConfig,
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
}

/// Page retriever settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Total load attempts per request, first one included
    pub retries: u32,

    /// Hard deadline for one navigation
    ///
    /// Default: 30 seconds
    pub page_load_timeout_ms: u64,

    /// Grace period after navigation before the DOM is captured
    pub settle_delay_ms: u64,

    /// Backoff before attempt `n + 1` is `base * 2^(n - 1)` plus jitter
    pub backoff_base_ms: u64,
    pub backoff_jitter_ms: u64,

    pub headless: bool,

    /// Browser binary; searched for (then downloaded) when unset
    pub chrome_executable: Option<PathBuf>,

    pub normalization: NormalizationPolicy,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_FETCH_RETRIES,
            page_load_timeout_ms: DEFAULT_PAGE_LOAD_TIMEOUT_SECS * 1000,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_jitter_ms: DEFAULT_BACKOFF_JITTER_MS,
            headless: true,
            chrome_executable: None,
            normalization: NormalizationPolicy::default(),
        }
    }
}

impl RetrieverConfig {
    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Decision pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Length of both token encodings
    pub max_length: usize,
    /// Probability at or above which a page is phishing
    pub phishing_threshold: f64,
    /// Confidence reported for allow-listed URLs
    pub whitelist_confidence: f64,
    /// Fixed delay on the allow-list path
    pub whitelist_delay_ms: u64,
    pub cache_ttl_secs: u64,
    /// Default row count for the cache refresh job
    pub refresh_limit: u32,
    /// Added to the curated allow-list domains
    pub whitelist_domains: Vec<String>,
    /// Added to the curated allow-list URLs
    pub whitelist_urls: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            phishing_threshold: DEFAULT_PHISHING_THRESHOLD,
            whitelist_confidence: WHITELIST_CONFIDENCE,
            whitelist_delay_ms: WHITELIST_DELAY_MS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            refresh_limit: DEFAULT_REFRESH_LIMIT,
            whitelist_domains: Vec::new(),
            whitelist_urls: Vec::new(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn whitelist_delay(&self) -> Duration {
        Duration::from_millis(self.whitelist_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://qshing.sqlite".to_string(),
            max_connections: 10,
        }
    }
}

impl StoreConfig {
    /// Private in-memory database, gone when the pool closes
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// Model artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Exported dual-input ONNX model
    pub model_path: PathBuf,
    /// `tokenizer.json` of the content-channel sub-word tokenizer
    pub tokenizer_path: PathBuf,
    /// Name of the probability output; the last output when unset
    pub probability_output: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/qshing.onnx"),
            tokenizer_path: PathBuf::from("models/tokenizer.json"),
            probability_output: Some("probability".to_string()),
        }
    }
}

/// HTTP surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed origins; empty allows any
    pub cors_origins: Vec<String>,
    /// Outer deadline for one `/analyze` request
    pub analyze_deadline_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn analyze_deadline(&self) -> Duration {
        Duration::from_secs(self.analyze_deadline_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
            analyze_deadline_secs: 120,
        }
    }
}
