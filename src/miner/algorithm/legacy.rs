// src/miner/algorithm/legacy.rs
//! Legacy hash variants
//!
//! SHA-1 and MD5 fallbacks for ledger deployments that predate the
//! SHA-256 rollout. Both produce shorter digests, which makes the
//! leading-zero check correspondingly cheaper to satisfy; the ledger is
//! the authority on which variant it validates.

use crate::miner::algorithm::Algorithm;
use crate::types::AlgorithmType;
use md5::{Digest, Md5};
use sha1::Sha1;

/// SHA-1 implementation of the [`Algorithm`] trait
pub struct Sha1Algo;

impl Algorithm for Sha1Algo {
    fn hash(&self, data: &str, nonce: u64) -> String {
        let mut hasher = Sha1::new();
        hasher.update(data.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn kind(&self) -> AlgorithmType {
        AlgorithmType::Sha1
    }
}

/// MD5 implementation of the [`Algorithm`] trait
pub struct Md5Algo;

impl Algorithm for Md5Algo {
    fn hash(&self, data: &str, nonce: u64) -> String {
        let mut hasher = Md5::new();
        hasher.update(data.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn kind(&self) -> AlgorithmType {
        AlgorithmType::Md5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vector() {
        // sha1("X0")
        assert_eq!(
            Sha1Algo.hash("X", 0),
            "7a3514b94d44a5bdf258e7dbc1edcaa7f0c92be4"
        );
    }

    #[test]
    fn md5_known_vector() {
        // md5("X0")
        assert_eq!(Md5Algo.hash("X", 0), "babe7a4bfc4dc3e6126df72f13c920cd");
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(Sha1Algo.hash("a", 1).len(), 40);
        assert_eq!(Md5Algo.hash("a", 1).len(), 32);
    }
}
