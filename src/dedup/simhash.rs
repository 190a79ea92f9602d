//! 64-bit SimHash fingerprints.
//!
//! Every token votes on each of the 64 bits of the fingerprint with its own hash:
//! `+1` when the token hash has the bit set, `-1` otherwise. A fingerprint bit is set
//! when its vote total is strictly positive. Texts sharing most of their tokens end up
//! with fingerprints that are a few bits apart.
use std::hash::Hasher;

use lazy_static::lazy_static;
use regex::Regex;
use twox_hash::XxHash64;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"[A-Za-z0-9][A-Za-z0-9\-']+").unwrap();
}

/// Fingerprint width, in bits.
pub const BITS: u32 = 64;

/// Fixed seed: fingerprints must be identical across runs.
const TOKEN_SEED: u64 = 0;

/// Lowercase word-like tokens: ASCII alphanumeric runs of at least two characters,
/// which may contain hyphens and apostrophes after the first character.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn token_hash(token: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(TOKEN_SEED);
    hasher.write(token.as_bytes());
    hasher.finish()
}

/// Computes the SimHash of `text`.
///
/// Returns `0` when `text` has no tokens. Callers must treat that value as "no signal":
/// two token-less texts share it without being duplicates.
pub fn simhash64(text: &str) -> u64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0;
    }

    let mut votes = [0i64; BITS as usize];
    for token in &tokens {
        let h = token_hash(token);
        for (bit, vote) in votes.iter_mut().enumerate() {
            if (h >> bit) & 1 == 1 {
                *vote += 1;
            } else {
                *vote -= 1;
            }
        }
    }

    votes
        .iter()
        .enumerate()
        .filter(|(_, vote)| **vote > 0)
        .fold(0u64, |acc, (bit, _)| acc | (1 << bit))
}

/// Number of differing bits.
#[inline]
pub fn hamming64(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Linear similarity proxy in `[0, 1]`, `1` meaning identical fingerprints.
#[inline]
pub fn approx_similarity_from_hamming(distance: u32) -> f64 {
    1.0 - f64::from(distance) / f64::from(BITS)
}
