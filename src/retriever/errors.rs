//! Error types for page retrieval

use std::time::Duration;

use super::normalize::NormalizeError;

/// A single driver operation failed
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    #[error("failed to launch browser driver: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("{operation} timeout after {}s", after.as_secs_f64())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("failed to capture page source: {0}")]
    PageSource(String),

    #[error("page source was empty")]
    EmptyPage,

    #[error("driver already released")]
    Released,

    #[error("failed to close driver: {0}")]
    Close(String),
}

impl DriverError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Page retrieval failed for good
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("failed to load {url} after {attempts} attempt(s): {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: DriverError,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] NormalizeError),
}

pub type DriverResult<T> = Result<T, DriverError>;
pub type FetchResult<T> = Result<T, FetchError>;
