//! Character-level URL tokenizer
//!
//! Every printable ASCII character the model saw during training has a fixed
//! id; anything else collapses to `[NONE]`. The table is built once and never
//! changes, so identical URLs always produce identical encodings.
//!
//! Id layout:
//! - `0..=29`   punctuation and space
//! - `30..=39`  digits
//! - `40..=65`  uppercase letters
//! - `66..=91`  lowercase letters
//! - `92..=97`  `:`, `/`, `[PAD]`, `[NONE]`, `[CLS]`, `[SEP]`

use std::collections::HashMap;

use super::types::TokenEncoding;

pub const COLON_ID: i64 = 92;
pub const SLASH_ID: i64 = 93;
pub const PAD_ID: i64 = 94;
pub const NONE_ID: i64 = 95;
pub const CLS_ID: i64 = 96;
pub const SEP_ID: i64 = 97;

pub const PAD_TOKEN: &str = "[PAD]";
pub const NONE_TOKEN: &str = "[NONE]";
pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";

/// Punctuation in id order. `:` and `/` are deliberately absent; they carry
/// their own reserved ids at the top of the table.
const PUNCTUATION: [char; 30] = [
    ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', ';', '<', '=',
    '>', '?', '@', '[', '\\', ']', '^', '_', '`', '{', '|', '}',
];

/// Tokens skipped by [`UrlTokenizer::decode`]
const CONTROL_IDS: [i64; 3] = [PAD_ID, CLS_ID, SEP_ID];

/// Fixed-vocabulary character tokenizer for URLs
#[derive(Debug, Clone)]
pub struct UrlTokenizer {
    char_to_id: HashMap<char, i64>,
    id_to_token: Vec<String>,
}

impl UrlTokenizer {
    #[must_use]
    pub fn new() -> Self {
        let mut char_to_id = HashMap::with_capacity(94);

        let ranges = PUNCTUATION
            .iter()
            .copied()
            .chain('0'..='9')
            .chain('A'..='Z')
            .chain('a'..='z');
        for (id, ch) in ranges.enumerate() {
            char_to_id.insert(ch, id as i64);
        }
        char_to_id.insert(':', COLON_ID);
        char_to_id.insert('/', SLASH_ID);

        let mut id_to_token = vec![String::new(); (SEP_ID + 1) as usize];
        for (ch, id) in &char_to_id {
            id_to_token[*id as usize] = ch.to_string();
        }
        id_to_token[PAD_ID as usize] = PAD_TOKEN.to_string();
        id_to_token[NONE_ID as usize] = NONE_TOKEN.to_string();
        id_to_token[CLS_ID as usize] = CLS_TOKEN.to_string();
        id_to_token[SEP_ID as usize] = SEP_TOKEN.to_string();

        Self {
            char_to_id,
            id_to_token,
        }
    }

    /// Total number of ids, control tokens included
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.id_to_token.len()
    }

    /// Id of a single character, `[NONE]` when it is outside the vocabulary
    #[must_use]
    pub fn char_id(&self, ch: char) -> i64 {
        self.char_to_id.get(&ch).copied().unwrap_or(NONE_ID)
    }

    /// Encode one URL into a `[CLS]`-prefixed encoding of exactly `max_length`.
    ///
    /// An empty URL contributes nothing, not even `[CLS]`, and yields an
    /// all-padding encoding.
    #[must_use]
    pub fn encode_url(&self, url: &str, max_length: usize) -> TokenEncoding {
        self.encode_urls(&[url], max_length)
    }

    /// Encode several URLs as one sequence.
    ///
    /// The first non-skipped URL is introduced by `[CLS]`, each later one by
    /// `[SEP]`. Empty URLs are skipped entirely.
    #[must_use]
    pub fn encode_urls(&self, urls: &[&str], max_length: usize) -> TokenEncoding {
        let mut ids = Vec::with_capacity(max_length);

        for url in urls {
            if url.is_empty() {
                continue;
            }
            ids.push(if ids.is_empty() { CLS_ID } else { SEP_ID });
            ids.extend(url.chars().map(|ch| self.char_id(ch)));
        }

        TokenEncoding::from_ids(ids, max_length, PAD_ID)
    }

    /// Map ids back to text, dropping padding and `[CLS]`/`[SEP]`.
    ///
    /// Ids outside the table are ignored; `[NONE]` is rendered literally.
    #[must_use]
    pub fn decode(&self, ids: &[i64]) -> String {
        ids.iter()
            .copied()
            .filter(|id| !CONTROL_IDS.contains(id))
            .filter_map(|id| usize::try_from(id).ok())
            .filter_map(|id| self.id_to_token.get(id))
            .map(String::as_str)
            .collect()
    }
}

impl Default for UrlTokenizer {
    fn default() -> Self {
        Self::new()
    }
}
