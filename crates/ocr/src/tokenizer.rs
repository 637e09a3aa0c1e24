//! Character vocabulary and CTC label collapsing
//!
//! The label file is a JSON object mapping each token to an arbitrary integer.
//! Entries are re-indexed densely by ascending original value, and the first two
//! model classes are reserved: class `0` is the CTC blank and class `1` is padding.
//! Class `k >= 2` maps to vocabulary entry `k - 2`.
//!
//! # Example
//! ```
//! use line_ocr::Tokenizer;
//!
//! # fn main() -> Result<(), line_ocr::OcrError> {
//! let tokenizer = Tokenizer::from_json_str(r#"{"a": 10, "b": 20}"#, "<unk>")?;
//! assert_eq!(tokenizer.vocab_size(), 3); // "<unk>" is appended
//! assert_eq!(tokenizer.decode_ctc(&[0, 2, 2, 1, 3, 3, 0]), "ab");
//! # Ok(())
//! # }
//! ```

use crate::error::{OcrError, Result};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Class id of the CTC blank
pub const BLANK_ID: usize = 0;
/// Class id of the padding frame
pub const PAD_ID: usize = 1;
/// Number of reserved classes in front of the vocabulary
pub const CTC_OFFSET: usize = 2;
/// Default unknown token
pub const DEFAULT_UNK_TOKEN: &str = "<unk>";

/// Raw `token -> value` pairs in the order they appear in the label file
///
/// `serde_json`'s own map type sorts keys, which would lose the document order
/// that breaks ties between equal values. A key repeated in the document keeps
/// its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVocabulary {
    entries: Vec<(String, i64)>,
    /// Token -> position in `entries`
    positions: HashMap<String, usize>,
}

impl RawVocabulary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a token's value
    pub fn insert(&mut self, token: impl Into<String>, value: i64) {
        let token = token.into();
        match self.positions.get(&token) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.positions.insert(token.clone(), self.entries.len());
                self.entries.push((token, value));
            }
        }
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.positions.contains_key(token)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of `token` in the raw mapping
    #[must_use]
    pub fn get(&self, token: &str) -> Option<i64> {
        self.positions
            .get(token)
            .map(|&position| self.entries[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for RawVocabulary {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut raw = RawVocabulary::new();
        for (token, value) in iter {
            raw.insert(token, value);
        }
        raw
    }
}

impl<'de> Deserialize<'de> for RawVocabulary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RawVocabularyVisitor;

        impl<'de> Visitor<'de> for RawVocabularyVisitor {
            type Value = RawVocabulary;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of tokens to integer ids")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let capacity = map.size_hint().unwrap_or(0);
                let mut raw = RawVocabulary {
                    entries: Vec::with_capacity(capacity),
                    positions: HashMap::with_capacity(capacity),
                };
                while let Some((token, value)) = map.next_entry::<String, i64>()? {
                    raw.insert(token, value);
                }
                Ok(raw)
            }
        }

        deserializer.deserialize_map(RawVocabularyVisitor)
    }
}

/// Dense vocabulary with CTC decoding
///
/// Immutable once built; share it across threads behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    token_to_id: HashMap<String, usize>,
    id_to_token: Vec<String>,
    unk_token: String,
}

impl Tokenizer {
    /// Build a tokenizer from a raw label mapping
    ///
    /// If `unk_token` is missing it is added with value `max + 1` before re-indexing.
    /// Entries are then sorted by value (stable, so equal values keep document order)
    /// and numbered from zero.
    ///
    /// # Errors
    /// Returns [`OcrError::EmptyVocabulary`] if `raw` has no entries.
    pub fn build(mut raw: RawVocabulary, unk_token: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(OcrError::EmptyVocabulary);
        }

        if !raw.contains(unk_token) {
            let max_value = raw.iter().map(|(_, v)| v).max().unwrap_or(-1);
            let unk_value = max_value.saturating_add(1);
            debug!(
                "Unknown token {:?} not in vocabulary, appending with value {}",
                unk_token, unk_value
            );
            raw.insert(unk_token, unk_value);
        }

        let mut items = raw.entries;
        items.sort_by_key(|(_, value)| *value);

        let mut token_to_id = HashMap::with_capacity(items.len());
        let mut id_to_token = Vec::with_capacity(items.len());
        for (new_id, (token, _)) in items.into_iter().enumerate() {
            token_to_id.insert(token.clone(), new_id);
            id_to_token.push(token);
        }

        Ok(Self {
            token_to_id,
            id_to_token,
            unk_token: unk_token.to_string(),
        })
    }

    /// Parse a JSON label mapping and build a tokenizer from it
    pub fn from_json_str(json: &str, unk_token: &str) -> Result<Self> {
        let raw: RawVocabulary = serde_json::from_str(json)?;
        Self::build(raw, unk_token)
    }

    /// Load a JSON label file and build a tokenizer from it
    pub fn from_file<P: AsRef<Path>>(path: P, unk_token: &str) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let tokenizer = Self::from_json_str(&contents, unk_token)?;
        info!(
            "Loaded vocabulary from {} ({} tokens)",
            path.display(),
            tokenizer.vocab_size()
        );
        Ok(tokenizer)
    }

    /// Number of vocabulary entries, including the unknown token
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.id_to_token.len()
    }

    /// Number of model classes (vocabulary plus the reserved blank and pad)
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.vocab_size() + CTC_OFFSET
    }

    #[must_use]
    pub fn unk_token(&self) -> &str {
        &self.unk_token
    }

    /// Token at dense vocabulary index `id`
    #[must_use]
    pub fn token(&self, id: usize) -> Option<&str> {
        self.id_to_token.get(id).map(String::as_str)
    }

    /// Dense vocabulary index of `token`
    #[must_use]
    pub fn id(&self, token: &str) -> Option<usize> {
        self.token_to_id.get(token).copied()
    }

    /// Tokens in dense id order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.id_to_token.iter().map(String::as_str)
    }

    /// Collapse a per-frame class sequence into text
    ///
    /// Blank and pad frames reset the repeat cursor, so `a blank a` yields `aa`
    /// while `a a` yields `a`. Class ids outside the vocabulary and the unknown
    /// token are dropped.
    #[must_use]
    pub fn decode_ctc(&self, ids: &[usize]) -> String {
        let mut out = String::new();
        let mut prev: Option<usize> = None;

        for &id in ids {
            if id == BLANK_ID || id == PAD_ID {
                prev = Some(id);
                continue;
            }
            if prev == Some(id) {
                continue;
            }
            prev = Some(id);

            if let Some(token) = self.token(id - CTC_OFFSET) {
                if token != self.unk_token {
                    out.push_str(token);
                }
            }
        }

        out
    }
}
