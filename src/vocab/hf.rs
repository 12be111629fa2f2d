//! Vocabulary extraction from HuggingFace `tokenizer.json` files.

use std::path::Path;

use tokenizers::Tokenizer;

use crate::error::{ConvertError, Result};

use super::byte_level;

/// One tokenizer vocabulary entry as stored in the container
#[derive(Debug, Clone, PartialEq)]
pub struct VocabEntry {
    /// Raw token bytes
    pub token: Vec<u8>,
    /// Token id as the tokenizer assigns it
    pub id: u32,
    /// Reserved score field, 0.0 for BPE vocabularies
    pub score: f32,
}

/// Full vocabulary in ascending-id order
#[derive(Debug, Clone)]
pub struct Vocab {
    entries: Vec<VocabEntry>,
}

impl Vocab {
    /// Load a `tokenizer.json` and extract its vocabulary
    pub fn from_tokenizer_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| ConvertError::TokenizerParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::from_tokenizer(&tokenizer))
    }

    /// Extract the vocabulary of an already-loaded tokenizer.
    ///
    /// Walks ids `0..vocab_size` including added tokens. Byte-level BPE
    /// token strings are decoded back to raw bytes through the inverse
    /// GPT-2 table; everything else keeps its UTF-8 bytes.
    #[must_use]
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Self {
        let size = tokenizer.get_vocab_size(true) as u32;
        let table = byte_level::unicode_to_byte_table();

        let mut entries = Vec::with_capacity(size as usize);
        for id in 0..size {
            let Some(token) = tokenizer.id_to_token(id) else {
                continue;
            };
            entries.push(VocabEntry {
                token: byte_level::decode_token(&table, &token),
                id,
                score: 0.0,
            });
        }
        Self { entries }
    }

    /// Entries in ascending-id order
    #[must_use]
    pub fn entries(&self) -> &[VocabEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the vocabulary has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal byte-level BPE tokenizer.json: "a", "b", "ab", "Ġa"
    const TINY_TOKENIZER_JSON: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": null,
  "pre_tokenizer": {
    "type": "ByteLevel",
    "add_prefix_space": false,
    "trim_offsets": true,
    "use_regex": true
  },
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "BPE",
    "dropout": null,
    "unk_token": null,
    "continuing_subword_prefix": null,
    "end_of_word_suffix": null,
    "fuse_unk": false,
    "byte_fallback": false,
    "vocab": {"a": 0, "b": 1, "ab": 2, "Ġa": 3},
    "merges": ["a b"]
  }
}"#;

    fn tiny_tokenizer_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TINY_TOKENIZER_JSON.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_vocab_from_tokenizer_file() {
        let file = tiny_tokenizer_file();
        let vocab = Vocab::from_tokenizer_file(file.path()).unwrap();
        assert_eq!(vocab.len(), 4);
        assert!(!vocab.is_empty());
    }

    #[test]
    fn test_entries_in_ascending_id_order() {
        let file = tiny_tokenizer_file();
        let vocab = Vocab::from_tokenizer_file(file.path()).unwrap();
        let ids: Vec<u32> = vocab.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_byte_level_tokens_decoded_to_raw_bytes() {
        let file = tiny_tokenizer_file();
        let vocab = Vocab::from_tokenizer_file(file.path()).unwrap();
        assert_eq!(vocab.entries()[0].token, b"a");
        assert_eq!(vocab.entries()[2].token, b"ab");
        // "Ġa" decodes to a space-prefixed token
        assert_eq!(vocab.entries()[3].token, b" a");
    }

    #[test]
    fn test_scores_are_reserved_zero() {
        let file = tiny_tokenizer_file();
        let vocab = Vocab::from_tokenizer_file(file.path()).unwrap();
        assert!(vocab.entries().iter().all(|e| e.score == 0.0));
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = Vocab::from_tokenizer_file("/nonexistent/tokenizer.json").unwrap_err();
        assert!(matches!(err, ConvertError::TokenizerParse { .. }));
    }

    #[test]
    fn test_garbage_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        file.flush().unwrap();
        let err = Vocab::from_tokenizer_file(file.path()).unwrap_err();
        assert!(matches!(err, ConvertError::TokenizerParse { .. }));
    }
}
