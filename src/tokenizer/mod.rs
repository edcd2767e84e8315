//! Tokenization of the two scorer input channels
//!
//! - URL channel: fixed character vocabulary, see [`UrlTokenizer`]
//! - Content channel: markup reduced to English sentences, then handed to a
//!   sub-word tokenizer, see [`ContentEncoder`]
//!
//! Both channels produce a [`TokenEncoding`] of the same length so the
//! scorer can treat the pair as one example. Nothing here performs I/O
//! after construction.

mod content;
mod subword;
mod text;
mod types;
mod url_vocab;

pub use content::{CONTENT_CLS, CONTENT_SEP, ContentEncoder, PreparedContent};
pub use subword::{HfSubwordTokenizer, SubwordTokenizer};
pub use text::{extract_text, split_sentences};
pub use types::{TokenEncoding, TokenizerError, TokenizerResult};
pub use url_vocab::{
    CLS_ID, CLS_TOKEN, COLON_ID, NONE_ID, NONE_TOKEN, PAD_ID, PAD_TOKEN, SEP_ID, SEP_TOKEN,
    SLASH_ID, UrlTokenizer,
};
