//! Scoring model seam
//!
//! The classifier itself is opaque: two aligned token encodings in, one
//! phishing probability out. [`OnnxScorer`] runs an exported dual-input
//! model; tests substitute fixed scorers.

mod onnx;

pub use onnx::OnnxScorer;

use crate::tokenizer::TokenEncoding;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScoringError {
    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("scorer unavailable: {0}")]
    Unavailable(String),

    #[error("model produced an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("inference failed: {0}")]
    Inference(String),
}

pub type ScoringResult<T> = Result<T, ScoringError>;

/// Opaque `(url, content) -> probability` function.
///
/// Calls may block for the duration of a forward pass; async callers run
/// them on the blocking pool.
pub trait Scorer: Send + Sync {
    fn score(&self, url: &TokenEncoding, content: &TokenEncoding) -> ScoringResult<f64>;

    /// Human-readable model identifier for logs and health output
    fn name(&self) -> &str;

    /// Readiness check. A scorer that loaded at startup is ready unless it
    /// reports otherwise.
    ///
    /// # Errors
    ///
    /// [`ScoringError::Unavailable`] when scoring cannot currently run.
    fn ready(&self) -> ScoringResult<()> {
        Ok(())
    }
}

/// Accept only finite probabilities in `[0, 1]`
///
/// # Errors
///
/// [`ScoringError::InvalidProbability`] for NaN, infinities and values
/// outside the unit interval.
pub fn validate_probability(p: f64) -> ScoringResult<f64> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(ScoringError::InvalidProbability(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_probability() {
        assert_eq!(validate_probability(0.0).ok(), Some(0.0));
        assert_eq!(validate_probability(1.0).ok(), Some(1.0));
        assert!(validate_probability(1.000_1).is_err());
        assert!(validate_probability(-0.1).is_err());
        assert!(validate_probability(f64::NAN).is_err());
        assert!(validate_probability(f64::INFINITY).is_err());
    }
}
