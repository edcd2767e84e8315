//! Sub-word tokenizer used by the content channel.

use std::path::Path;

use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::types::{TokenEncoding, TokenizerError, TokenizerResult};

/// Anything that turns text into a fixed-length sub-word encoding.
///
/// Implementations must truncate and pad to `max_length`.
pub trait SubwordTokenizer: Send + Sync {
    fn encode(&self, text: &str, max_length: usize) -> TokenizerResult<TokenEncoding>;
}

/// WordPiece/BPE tokenizer loaded from a `tokenizer.json` artifact
/// (the `bert-base-uncased` export in the default deployment).
pub struct HfSubwordTokenizer {
    inner: Tokenizer,
    pad_id: i64,
}

impl HfSubwordTokenizer {
    /// Load a tokenizer definition and configure it for `max_length`.
    ///
    /// # Errors
    ///
    /// Returns `TokenizerError::Load` if the file is missing or malformed.
    pub fn from_file(path: &Path, max_length: usize) -> TokenizerResult<Self> {
        let mut inner = Tokenizer::from_file(path).map_err(|e| TokenizerError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let pad_token = "[PAD]".to_string();
        let pad_id = inner.token_to_id(&pad_token).unwrap_or(0);

        inner
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| TokenizerError::Configuration(e.to_string()))?;
        inner.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token,
            ..Default::default()
        }));

        tracing::info!(path = %path.display(), max_length, "Sub-word tokenizer loaded");

        Ok(Self {
            inner,
            pad_id: i64::from(pad_id),
        })
    }
}

impl SubwordTokenizer for HfSubwordTokenizer {
    fn encode(&self, text: &str, max_length: usize) -> TokenizerResult<TokenEncoding> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;

        let ids = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mask = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();

        Ok(TokenEncoding::from_parts(ids, mask, max_length, self.pad_id))
    }
}
