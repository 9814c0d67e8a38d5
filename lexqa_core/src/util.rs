//! Hashing helpers for stable identifiers.

use sha2::{Digest, Sha256};

/// First `len` hex characters of the SHA-256 digest of `text`.
#[must_use]
pub fn short_hash(text: &str, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(len);
    hex
}

/// Identifier shared by trivially different phrasings of the same question.
///
/// The question is lower-cased and trailing `?` and whitespace are dropped
/// before hashing.
#[must_use]
pub fn user_question_id(question: &str) -> String {
    let lowered = question.to_lowercase();
    let clean = lowered.trim_end_matches(|c: char| c == '?' || c.is_whitespace());
    short_hash(clean, 10)
}
