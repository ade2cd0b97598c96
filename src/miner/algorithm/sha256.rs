// src/miner/algorithm/sha256.rs
//! SHA-256 hash variant
//!
//! The primary variant: every new ledger deployment validates submissions
//! with SHA-256 over `data || decimal(nonce)`.

use crate::miner::algorithm::Algorithm;
use crate::types::AlgorithmType;
use sha2::{Digest, Sha256};

/// SHA-256 implementation of the [`Algorithm`] trait
///
/// Stateless; a single instance is shared across all workers of a round.
pub struct Sha256Algo;

impl Algorithm for Sha256Algo {
    fn hash(&self, data: &str, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn kind(&self) -> AlgorithmType {
        AlgorithmType::Sha256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // sha256("X0")
        assert_eq!(
            Sha256Algo.hash("X", 0),
            "1a60e15b3d720d95784ec7a04cf48bffa6b430f7f30c8acd95a3cfb7f6e8739b"
        );
    }

    #[test]
    fn deterministic() {
        let a = Sha256Algo.hash("payload", 42);
        let b = Sha256Algo.hash("payload", 42);
        assert_eq!(a, b);
        assert_ne!(a, Sha256Algo.hash("payload", 43));
    }

    #[test]
    fn nonce_is_appended_as_decimal() {
        // hash("X", 1) must equal hashing the literal string "X1"
        assert_eq!(
            Sha256Algo.hash("X", 1),
            "ad667b78ba8ed0275868fcc1c3650f7d5c73fc6143352d3f65bbc292dc36a511"
        );
    }
}
