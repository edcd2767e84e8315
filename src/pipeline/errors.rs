use std::time::Duration;

use crate::retriever::FetchError;
use crate::store::StoreError;
use crate::tokenizer::TokenizerError;

/// Hard failures of `analyze`
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to persist detection: {0}")]
    Persist(#[source] StoreError),

    #[error("failed to encode page content: {0}")]
    Encoding(#[from] TokenizerError),

    #[error("analysis of {url} did not finish within {}s", deadline.as_secs_f64())]
    DeadlineExceeded { url: String, deadline: Duration },
}

pub type AnalysisOutcome = Result<super::AnalysisResult, AnalysisError>;
