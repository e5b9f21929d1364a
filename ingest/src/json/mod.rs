//! Streaming JSON tokenizer and lightweight value tree.
//!
//! The parser never builds a map of materialized strings. Each
//! [`JsonValue`] records only its kind, the byte range it occupies in the
//! source, its children, and (for objects) a table from the rolling hash of
//! each key to the child it names. Text is decoded only when a leaf is read
//! as a string or number.
//!
//! # Key lookup
//!
//! Keys are looked up by hash alone. Two distinct keys whose hashes collide
//! alias each other; only the first one registered is reachable. The glTF
//! vocabulary is small and fixed, so this is accepted as a trade-off. Debug
//! builds confirm every `&str` lookup against the key text and fall back to a
//! linear scan on mismatch; release builds trust the hash.
//!
//! # Example
//!
//! ```ignore
//! use redlilium_ingest::json::JsonDocument;
//!
//! let doc = JsonDocument::parse(StreamWindow::new(br#"{"count": 3}"#.to_vec()))?;
//! assert_eq!(doc.root().child_i32_or("count", 0), 3);
//! ```

mod parser;
mod text;
mod token;
mod value;

pub use text::unescape;
pub use token::{Token, Tokenizer};
pub use value::{JsonDocument, JsonKind, JsonValue};

/// Seed of the rolling key hash.
pub const HASH_SEED: i64 = 1_125_899_906_842_597;

/// Folds one byte into a rolling hash.
#[inline]
pub const fn hash_step(hash: i64, byte: u8) -> i64 {
    hash.wrapping_mul(31).wrapping_add(byte as i64)
}

/// Hashes a complete key.
///
/// Usable in `const` context, so well-known keys are hashed at compile time.
pub const fn key_hash(key: &str) -> i64 {
    let bytes = key.as_bytes();
    let mut hash = HASH_SEED;
    let mut i = 0;
    while i < bytes.len() {
        hash = hash_step(hash, bytes[i]);
        i += 1;
    }
    hash
}

/// Hash of the bareword `true`.
pub const TRUE_HASH: i64 = key_hash("true");
/// Hash of the bareword `false`.
pub const FALSE_HASH: i64 = key_hash("false");
/// Hash of the bareword `null`.
pub const NULL_HASH: i64 = key_hash("null");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_hashes() {
        assert_eq!(TRUE_HASH, 6_774_539_739_450_702_579);
        assert_eq!(FALSE_HASH, 7_096_547_112_153_268_318);
        assert_eq!(NULL_HASH, 6_774_539_739_450_526_444);
    }

    #[test]
    fn test_hash_is_position_independent() {
        assert_eq!(key_hash("bufferView"), key_hash("bufferView"));
        assert_ne!(key_hash("bufferView"), key_hash("bufferViews"));
        assert_eq!(key_hash(""), HASH_SEED);
    }
}
