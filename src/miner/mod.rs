// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components related to the search side of a
//! round:
//! - Hash variant implementations
//! - Round scheduling and the first-result race
//! - Worker scan loops
//! - Adaptive difficulty tuning

/// Hash variant implementations
///
/// SHA-256 as the primary variant plus the SHA-1/MD5 legacy fallbacks,
/// behind a common trait resolved once per round.
pub mod algorithm;

/// Adaptive difficulty controller
///
/// Tunes the leading-zero requirement from the rolling window of
/// per-round hash rates.
pub mod difficulty;

/// Mining round scheduler
///
/// Partitions the nonce domain across the worker pool, races workers to
/// the first solution, and enforces the round timeout.
pub mod scheduler;

/// Worker scan loop
///
/// Sequential in-order scan of an assigned nonce window with batched
/// cancellation checks and hash accounting.
pub mod worker;

// Re-export main components for cleaner imports
pub use self::algorithm::{Algorithm, meets_difficulty};
pub use self::difficulty::DifficultyController;
pub use self::scheduler::{BlockCandidate, NonceRange, Scheduler, Solution};
pub use self::worker::Worker;
