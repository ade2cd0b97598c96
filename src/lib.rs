//! Proof-of-work mining client for HTTP ledger services
//!
//! This crate implements a complete search-and-submit mining client:
//! - Concurrent nonce search across a bounded worker pool, raced to the
//!   first valid solution with cooperative cancellation
//! - Leading-zero hash validity over selectable variants (SHA-256
//!   primary, SHA-1/MD5 legacy fallbacks)
//! - Adaptive difficulty tuning from a rolling hash-rate window
//! - A retrying submission pipeline with full response classification
//! - Lock-guarded shared session statistics

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Miner core implementation including hash variants and scheduling
pub mod miner;

/// Network communication with the remote ledger service
pub mod network;

/// Statistics collection and reporting functionality
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use miner::{Algorithm, BlockCandidate, DifficultyController, Scheduler, Solution};
pub use network::{ApiClient, SubmissionOutcome, SubmissionPipeline};
pub use stats::{MiningStats, StatsAggregator, StatsReporter};
pub use types::AlgorithmType;
pub use utils::{MinerError, init_logging};
