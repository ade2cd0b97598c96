// src/types.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported hash variants for the proof-of-work search
///
/// The ledger service validates submissions with the same variant, so the
/// selection is resolved once per round and threaded through the scheduler
/// rather than re-read per hash call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum AlgorithmType {
    /// SHA-256 (primary variant)
    ///
    /// Default for all rounds; 64-character lowercase hex digests.
    #[clap(name = "sha256")]
    Sha256,

    /// SHA-1 (legacy fallback)
    ///
    /// Shorter 40-character digests; only useful against ledgers that
    /// still validate with it.
    #[clap(name = "sha1")]
    Sha1,

    /// MD5 (legacy fallback)
    ///
    /// 32-character digests; kept for compatibility with older ledger
    /// deployments.
    #[clap(name = "md5")]
    Md5,
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmType::Sha256 => write!(f, "sha256"),
            AlgorithmType::Sha1 => write!(f, "sha1"),
            AlgorithmType::Md5 => write!(f, "md5"),
        }
    }
}

impl FromStr for AlgorithmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(AlgorithmType::Sha256),
            "sha1" | "sha-1" => Ok(AlgorithmType::Sha1),
            "md5" => Ok(AlgorithmType::Md5),
            _ => Err(format!("Unknown algorithm: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("sha256".parse::<AlgorithmType>(), Ok(AlgorithmType::Sha256));
        assert_eq!("SHA-1".parse::<AlgorithmType>(), Ok(AlgorithmType::Sha1));
        assert_eq!("md5".parse::<AlgorithmType>(), Ok(AlgorithmType::Md5));
        assert!("scrypt".parse::<AlgorithmType>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for algo in [AlgorithmType::Sha256, AlgorithmType::Sha1, AlgorithmType::Md5] {
            assert_eq!(algo.to_string().parse::<AlgorithmType>(), Ok(algo));
        }
    }
}
