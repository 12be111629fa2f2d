//! GPT-2 byte-level encoding tables.
//!
//! Byte-level BPE vocabularies store token strings in a reversible unicode
//! alphabet: printable Latin-1 bytes map to themselves, everything else is
//! shifted above U+0100. Serializing a vocabulary means undoing that mapping
//! so the container holds the raw token bytes.

use std::collections::HashMap;

/// Bytes the encoding keeps verbatim (printable, minus the soft hyphen)
fn is_verbatim(byte: u8) -> bool {
    matches!(byte, 0x21..=0x7E | 0xA1..=0xAC | 0xAE..=0xFF)
}

/// Forward table: byte value to its unicode stand-in
#[must_use]
pub fn byte_to_unicode_table() -> [char; 256] {
    let mut table = ['\u{FFFD}'; 256];
    let mut shifted = 0u32;
    for byte in 0..=255u8 {
        let code_point = if is_verbatim(byte) {
            u32::from(byte)
        } else {
            let cp = 256 + shifted;
            shifted += 1;
            cp
        };
        if let Some(c) = char::from_u32(code_point) {
            table[byte as usize] = c;
        }
    }
    table
}

/// Inverse table: unicode stand-in back to the byte it encodes
#[must_use]
pub fn unicode_to_byte_table() -> HashMap<char, u8> {
    let mut map = HashMap::with_capacity(256);
    for (byte, &c) in byte_to_unicode_table().iter().enumerate() {
        map.insert(c, byte as u8);
    }
    map
}

/// Decode one token string to raw bytes.
///
/// Token strings made entirely of table characters decode through the
/// inverse mapping. Anything else (added tokens, special tokens,
/// sentencepiece vocabularies) falls back to the string's UTF-8 bytes.
#[must_use]
pub fn decode_token(table: &HashMap<char, u8>, token: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(token.len());
    for c in token.chars() {
        match table.get(&c) {
            Some(&byte) => bytes.push(byte),
            None => return token.as_bytes().to_vec(),
        }
    }
    bytes
}
