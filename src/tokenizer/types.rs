//! Fixed-length encodings shared by both scorer input channels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for tokenizer operations
pub type TokenizerResult<T> = Result<T, TokenizerError>;

/// Error types for tokenization
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// Sub-word vocabulary could not be loaded
    #[error("Failed to load sub-word tokenizer from {path}: {reason}")]
    Load { path: String, reason: String },

    /// Sub-word tokenizer rejected its configuration
    #[error("Invalid sub-word tokenizer configuration: {0}")]
    Configuration(String),

    /// Encoding a piece of text failed
    #[error("Sub-word encoding failed: {0}")]
    Encode(String),
}

/// `(input_ids, attention_mask)` pair of identical, fixed length.
///
/// Ids are stored as `i64` because that is the element type the scoring
/// model consumes; no conversion happens between tokenizer and scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEncoding {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl TokenEncoding {
    /// Build an encoding from unpadded ids, marking every id as attended.
    ///
    /// Truncates to `max_length` or right-pads with `pad_id` (mask 0).
    #[must_use]
    pub fn from_ids(mut input_ids: Vec<i64>, max_length: usize, pad_id: i64) -> Self {
        input_ids.truncate(max_length);
        let mut attention_mask = vec![1; input_ids.len()];

        input_ids.resize(max_length, pad_id);
        attention_mask.resize(max_length, 0);

        Self {
            input_ids,
            attention_mask,
        }
    }

    /// Build an encoding from ids and an explicit mask produced elsewhere.
    ///
    /// Both sequences are cut or padded to `max_length`, so a sub-word
    /// tokenizer configured for a different length still yields aligned
    /// output.
    #[must_use]
    pub fn from_parts(
        mut input_ids: Vec<i64>,
        mut attention_mask: Vec<i64>,
        max_length: usize,
        pad_id: i64,
    ) -> Self {
        attention_mask.resize(input_ids.len(), 1);
        input_ids.truncate(max_length);
        attention_mask.truncate(max_length);
        input_ids.resize(max_length, pad_id);
        attention_mask.resize(max_length, 0);

        Self {
            input_ids,
            attention_mask,
        }
    }

    /// Sequence length (equal for ids and mask)
    #[must_use]
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of attended positions
    #[must_use]
    pub fn non_pad_len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ids_pads_and_masks() {
        let enc = TokenEncoding::from_ids(vec![7, 8, 9], 5, 0);
        assert_eq!(enc.input_ids, vec![7, 8, 9, 0, 0]);
        assert_eq!(enc.attention_mask, vec![1, 1, 1, 0, 0]);
        assert_eq!(enc.non_pad_len(), 3);
    }

    #[test]
    fn test_from_ids_truncates() {
        let enc = TokenEncoding::from_ids(vec![1, 2, 3, 4], 2, 0);
        assert_eq!(enc.input_ids, vec![1, 2]);
        assert_eq!(enc.attention_mask, vec![1, 1]);
    }

    #[test]
    fn test_from_parts_aligns_mismatched_lengths() {
        let enc = TokenEncoding::from_parts(vec![101, 5, 102, 0], vec![1, 1, 1, 0], 6, 0);
        assert_eq!(enc.len(), 6);
        assert_eq!(enc.attention_mask, vec![1, 1, 1, 0, 0, 0]);

        let short = TokenEncoding::from_parts(vec![101, 5, 102], vec![1, 1, 1], 2, 0);
        assert_eq!(short.input_ids, vec![101, 5]);
        assert_eq!(short.attention_mask, vec![1, 1]);
    }
}
