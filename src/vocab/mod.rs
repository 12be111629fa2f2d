//! Tokenizer vocabulary extraction
//!
//! Turns a HuggingFace `tokenizer.json` into the ordered `(bytes, id, score)`
//! entries the container's vocabulary section stores.

pub mod byte_level;
mod hf;

pub use hf::{Vocab, VocabEntry};
