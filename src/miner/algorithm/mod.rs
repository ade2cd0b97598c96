// src/miner/algorithm/mod.rs
//! Hash variant implementations
//!
//! This module contains the supported hash variants and their common
//! interface. The ledger accepts work hashed with:
//! - SHA-256 (primary variant)
//! - SHA-1 and MD5 (legacy fallbacks)

/// SHA-256 implementation (primary variant)
pub mod sha256;

/// Legacy hash implementations (SHA-1, MD5)
///
/// Kept for ledger deployments that still validate with the older
/// variants. New deployments validate SHA-256 only.
pub mod legacy;

use crate::types::AlgorithmType;
use std::sync::Arc;

/// Common interface for all hash variants
///
/// Implementations must be cheap to share across worker threads; the
/// scheduler resolves one instance per round and hands a clone of the
/// `Arc` to every worker.
pub trait Algorithm: Send + Sync {
    /// Computes the digest of `data` concatenated with the decimal
    /// representation of `nonce`
    ///
    /// # Returns
    /// The digest as a lowercase hex string
    fn hash(&self, data: &str, nonce: u64) -> String;

    /// Returns the hash variant this instance implements
    fn kind(&self) -> AlgorithmType;
}

/// Creates a shareable instance of the requested hash variant
pub fn create(kind: AlgorithmType) -> Arc<dyn Algorithm> {
    match kind {
        AlgorithmType::Sha256 => Arc::new(sha256::Sha256Algo),
        AlgorithmType::Sha1 => Arc::new(legacy::Sha1Algo),
        AlgorithmType::Md5 => Arc::new(legacy::Md5Algo),
    }
}

/// Checks whether a hex digest meets the difficulty requirement
///
/// A digest is valid when it has at least `difficulty` characters and all
/// of the first `difficulty` characters are `'0'`. A digest shorter than
/// `difficulty` is never valid.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    if hash.len() < difficulty {
        return false;
    }
    hash.bytes().take(difficulty).all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_counts_leading_zeros() {
        assert!(meets_difficulty("0000ab", 4));
        assert!(meets_difficulty("0000ab", 3));
        assert!(!meets_difficulty("0001ab", 4));
        assert!(!meets_difficulty("a000ab", 1));
    }

    #[test]
    fn zero_difficulty_accepts_anything() {
        assert!(meets_difficulty("ff", 0));
        assert!(meets_difficulty("", 0));
    }

    #[test]
    fn short_hash_is_invalid() {
        assert!(!meets_difficulty("000", 4));
        assert!(!meets_difficulty("", 1));
    }

    #[test]
    fn factory_matches_requested_kind() {
        for kind in [AlgorithmType::Sha256, AlgorithmType::Sha1, AlgorithmType::Md5] {
            assert_eq!(create(kind).kind(), kind);
        }
    }
}
