// src/utils/error.rs
use std::io;
use thiserror::Error;

/// Main error type for the mining application
///
/// Covers the failure taxonomy of the submit protocol (transport, protocol,
/// application rejection, duplicate, rate limiting, retry exhaustion) as
/// well as worker faults, configuration and I/O errors.
#[derive(Error, Debug)]
pub enum MinerError {
    /// Connection-level failures: timeouts, refused connections, DNS
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Malformed responses or unexpected status codes from the ledger
    #[error("Protocol violation: {0}")]
    ProtocolError(String),

    /// The ledger explicitly rejected a submission
    ///
    /// Whether the rejection is worth retrying is decided by keyword
    /// classification in the submission pipeline and recorded on the
    /// resulting outcome, not here.
    #[error("Submission rejected: {0}")]
    RejectionError(String),

    /// The ledger already holds this block (HTTP 409 or duplicate keyword)
    #[error("Duplicate submission: {0}")]
    DuplicateError(String),

    /// The ledger asked us to slow down (HTTP 429)
    #[error("Rate limited by ledger")]
    RateLimitedError,

    /// All configured submission attempts were used without acceptance
    #[error("Submission failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Number of attempts consumed
        attempts: u32,
        /// Classification detail of the final failed attempt
        last_error: String,
    },

    /// Unexpected failure inside a search worker
    ///
    /// Isolated to the worker that raised it; never aborts a round.
    #[error("Worker fault: {0}")]
    WorkerFault(String),

    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Thread communication channel errors
    #[error("Thread communication error: {0}")]
    ChannelError(String),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts async task join errors into MinerError
///
/// Used when the blocking search task backing a round fails unexpectedly.
impl From<tokio::task::JoinError> for MinerError {
    fn from(e: tokio::task::JoinError) -> Self {
        MinerError::TaskError(format!("Async task failed: {}", e))
    }
}
