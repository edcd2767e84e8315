//! Content channel: page markup to a fixed-length sub-word encoding.

use std::sync::Arc;

use whatlang::Lang;

use super::subword::SubwordTokenizer;
use super::text::{extract_text, split_sentences};
use super::types::{TokenEncoding, TokenizerResult};

/// Class marker leading the joined content string
pub const CONTENT_CLS: &str = "[CLS]";
/// Separator inserted between kept sentences
pub const CONTENT_SEP: &str = "[SEP]";

/// Text selected from a page before sub-word tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedContent {
    /// `[CLS]` followed by the English spans joined with `[SEP]`
    pub text: String,
    /// Number of spans that survived language filtering
    pub kept_spans: usize,
    /// Number of spans found in the page text
    pub total_spans: usize,
}

impl PreparedContent {
    /// True when no English span survived and the text is just the class marker
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.kept_spans == 0
    }
}

/// English-only content encoder
#[derive(Clone)]
pub struct ContentEncoder {
    subword: Arc<dyn SubwordTokenizer>,
}

impl ContentEncoder {
    pub fn new(subword: Arc<dyn SubwordTokenizer>) -> Self {
        Self { subword }
    }

    /// Strip markup, split into spans and keep the English ones.
    ///
    /// Spans the detector cannot classify are dropped like non-English ones.
    #[must_use]
    pub fn prepare(&self, raw_markup: &str) -> PreparedContent {
        let text = extract_text(raw_markup);
        let spans = split_sentences(&text);
        let total_spans = spans.len();

        let kept: Vec<&str> = spans.into_iter().filter(|span| is_english(span)).collect();

        let mut joined = String::with_capacity(CONTENT_CLS.len() + text.len());
        joined.push_str(CONTENT_CLS);
        joined.push_str(&kept.join(CONTENT_SEP));

        tracing::debug!(total_spans, kept_spans = kept.len(), "content spans filtered");

        PreparedContent {
            text: joined,
            kept_spans: kept.len(),
            total_spans,
        }
    }

    /// Encode already prepared content.
    ///
    /// # Errors
    ///
    /// Propagates failures of the sub-word tokenizer.
    pub fn encode_prepared(
        &self,
        prepared: &PreparedContent,
        max_length: usize,
    ) -> TokenizerResult<TokenEncoding> {
        self.subword.encode(&prepared.text, max_length)
    }

    /// Full content pipeline: markup in, fixed-length encoding out.
    ///
    /// A page with no English text still encodes (to little more than the
    /// class marker); that is a low-information input, not an error.
    ///
    /// # Errors
    ///
    /// Propagates failures of the sub-word tokenizer.
    pub fn encode_content(&self, raw_markup: &str, max_length: usize) -> TokenizerResult<TokenEncoding> {
        let prepared = self.prepare(raw_markup);
        self.encode_prepared(&prepared, max_length)
    }
}

fn is_english(span: &str) -> bool {
    whatlang::detect(span).is_some_and(|info| info.lang() == Lang::Eng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::types::TokenizerError;

    /// Whitespace "tokenizer": one id per word, `[CLS]`/`[SEP]` as 101/102.
    struct WordCounter;

    impl SubwordTokenizer for WordCounter {
        fn encode(&self, text: &str, max_length: usize) -> TokenizerResult<TokenEncoding> {
            let ids = text
                .replace(CONTENT_CLS, " 101 ")
                .replace(CONTENT_SEP, " 102 ")
                .split_whitespace()
                .map(|w| w.parse::<i64>().unwrap_or(7))
                .collect();
            Ok(TokenEncoding::from_ids(ids, max_length, 0))
        }
    }

    struct Failing;

    impl SubwordTokenizer for Failing {
        fn encode(&self, _text: &str, _max_length: usize) -> TokenizerResult<TokenEncoding> {
            Err(TokenizerError::Encode("boom".into()))
        }
    }

    const ENGLISH_PAGE: &str = r#"<html><body>
        <p>Your account has been suspended because of unusual activity. Please confirm your identity by signing in with your password below!</p>
        <p>Votre compte a été suspendu en raison d'une activité inhabituelle et nous vous demandons de vous reconnecter.</p>
        </body></html>"#;

    #[test]
    fn test_prepare_keeps_only_english_spans() {
        let encoder = ContentEncoder::new(Arc::new(WordCounter));
        let prepared = encoder.prepare(ENGLISH_PAGE);

        assert_eq!(prepared.total_spans, 3);
        assert_eq!(prepared.kept_spans, 2);
        assert!(prepared.text.starts_with("[CLS]Your account"));
        assert!(prepared.text.contains("activity.[SEP]Please confirm"));
        assert!(!prepared.text.contains("Votre"));
    }

    #[test]
    fn test_no_english_spans_degenerates_to_class_marker() {
        let encoder = ContentEncoder::new(Arc::new(WordCounter));
        let prepared = encoder.prepare("<p>这是一个关于账户安全的通知，请尽快登录并验证您的身份信息。</p>");

        assert!(prepared.is_degenerate());
        assert_eq!(prepared.text, "[CLS]");

        let enc = encoder
            .encode_content("<p>这是一个关于账户安全的通知，请尽快登录并验证您的身份信息。</p>", 16)
            .expect("degenerate content must still encode");
        assert_eq!(enc.len(), 16);
        assert_eq!(enc.non_pad_len(), 1);
    }

    #[test]
    fn test_empty_markup_encodes() {
        let encoder = ContentEncoder::new(Arc::new(WordCounter));
        let enc = encoder.encode_content("", 8).expect("empty markup must encode");
        assert_eq!(enc.input_ids, vec![101, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_subword_failure_propagates() {
        let encoder = ContentEncoder::new(Arc::new(Failing));
        assert!(encoder.encode_content(ENGLISH_PAGE, 8).is_err());
    }
}
