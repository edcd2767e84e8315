//! Error types for the result stores

/// A backing store could not serve a request
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("stored document could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("background store task was cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
