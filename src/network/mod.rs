// src/network/mod.rs
//! Network communication components
//!
//! This module handles all interactions with the remote ledger service.
//! It provides two main pieces:
//! - `ApiClient`: wire-format client for probe, login, identity check,
//!   and the submission POST
//! - `SubmissionPipeline`: retry loop and response classification on top
//!   of the client

/// Ledger service client implementation
///
/// Owns the HTTP client and every request/response shape the ledger
/// speaks. Returns raw responses for submissions so classification stays
/// in the pipeline.
pub mod api;

/// Submission pipeline implementation
///
/// Classifies submission responses, retries with linear backoff, and
/// applies accepted results to the shared statistics.
pub mod submit;

// Re-export main components for cleaner imports
pub use api::{ApiClient, BlockAccepted, ClientInfo, LedgerSession, SystemInfo};
pub use submit::{SubmissionOutcome, SubmissionPipeline};
