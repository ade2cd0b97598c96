// src/network/submit.rs
//! Submission pipeline
//!
//! Posts a found solution to the ledger, classifies every response, and
//! retries with linearly growing delays. Rejections the ledger will never
//! change its mind about (duplicates, expired or invalid work) stop the
//! pipeline immediately; transport and protocol failures burn an attempt
//! each; an HTTP 429 pauses without consuming an attempt.

use crate::config::SubmitConfig;
use crate::miner::scheduler::Solution;
use crate::network::api::{ApiClient, BlockAccepted, SubmitResponse, SystemInfo};
use crate::stats::StatsAggregator;
use crate::utils::error::MinerError;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

/// Terminal result of submitting one solution
///
/// Carries enough detail (attempt count, last error) for an outer policy
/// such as "pause after N consecutive failures" to act on.
#[derive(Debug)]
pub struct SubmissionOutcome {
    /// Whether the ledger accepted the block
    pub accepted: bool,
    /// Whether the final classification would have been worth retrying
    /// had attempts remained
    pub retryable: bool,
    /// Attempts consumed (an HTTP 429 pause consumes none)
    pub attempts: u32,
    /// Classification of the terminal failure, absent on acceptance
    pub error: Option<MinerError>,
    /// Ledger-reported reward data, present on acceptance
    pub server: Option<BlockAccepted>,
}

enum Attempt {
    Accepted(BlockAccepted),
    Fatal(MinerError),
    RateLimited,
    Retry(String),
}

/// Retrying submission client over an [`ApiClient`]
pub struct SubmissionPipeline {
    api: ApiClient,
    stats: Arc<StatsAggregator>,
    user_id: u64,
    max_attempts: u32,
    retry_delay: Duration,
    rate_limit_backoff: Duration,
}

impl SubmissionPipeline {
    /// Creates a pipeline for the given account and retry policy
    pub fn new(
        api: ApiClient,
        stats: Arc<StatsAggregator>,
        user_id: u64,
        config: &SubmitConfig,
    ) -> Self {
        SubmissionPipeline {
            api,
            stats,
            user_id,
            max_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            rate_limit_backoff: Duration::from_millis(config.rate_limit_backoff_ms),
        }
    }

    /// Submits one solution, retrying per policy
    ///
    /// Before attempt *k* (k > 0) the pipeline sleeps `retry_delay * k`:
    /// linear growth, one, two, three times the base delay. A rate-limit
    /// response sleeps the configured backoff and retries at the same
    /// attempt index. Exhausting `max_attempts` yields a terminal
    /// [`MinerError::MaxRetriesExceeded`] outcome.
    pub async fn submit(
        &self,
        solution: &Solution,
        difficulty: u32,
        reported_rate: f64,
        system_info: SystemInfo,
    ) -> SubmissionOutcome {
        let mut attempts_used: u32 = 0;

        loop {
            let attempt_index = attempts_used + 1;
            log::info!(
                "Submitting block (attempt {}/{}, rate {:.0} H/s)",
                attempt_index,
                self.max_attempts,
                reported_rate
            );

            match self
                .attempt(solution, difficulty, reported_rate, &system_info, attempt_index)
                .await
            {
                Attempt::Accepted(block) => {
                    self.stats.apply_acceptance(&block);
                    let snap = self.stats.snapshot();
                    log::info!(
                        "Accepted {}/{} ({:.1}%) | +{:.8} | balance {:.8} | block #{} | power {}",
                        snap.accepted_blocks,
                        snap.accepted_blocks + snap.rejected_blocks,
                        snap.success_rate(),
                        block.final_reward,
                        block.new_balance,
                        block.block_number,
                        block.power_level.to_uppercase(),
                    );
                    return SubmissionOutcome {
                        accepted: true,
                        retryable: false,
                        attempts: attempt_index,
                        error: None,
                        server: Some(block),
                    };
                }
                Attempt::Fatal(error) => {
                    return SubmissionOutcome {
                        accepted: false,
                        retryable: false,
                        attempts: attempt_index,
                        error: Some(error),
                        server: None,
                    };
                }
                Attempt::RateLimited => {
                    log::warn!(
                        "{} (attempt {} keeps its slot, pausing {:?})",
                        MinerError::RateLimitedError,
                        attempt_index,
                        self.rate_limit_backoff
                    );
                    tokio::time::sleep(self.rate_limit_backoff).await;
                }
                Attempt::Retry(detail) => {
                    attempts_used += 1;
                    if attempts_used >= self.max_attempts {
                        let error = MinerError::MaxRetriesExceeded {
                            attempts: attempts_used,
                            last_error: detail,
                        };
                        log::error!("{}", error);
                        return SubmissionOutcome {
                            accepted: false,
                            retryable: false,
                            attempts: attempts_used,
                            error: Some(error),
                            server: None,
                        };
                    }
                    let delay = self.retry_delay * attempts_used;
                    log::warn!(
                        "Attempt {}/{} failed ({}); retrying in {:?}",
                        attempts_used,
                        self.max_attempts,
                        detail,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        solution: &Solution,
        difficulty: u32,
        reported_rate: f64,
        system_info: &SystemInfo,
        attempt_index: u32,
    ) -> Attempt {
        let response = match self
            .api
            .submit_block(
                self.user_id,
                solution,
                difficulty,
                reported_rate as u64,
                system_info,
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_network_error();
                let detail = if e.is_timeout() {
                    format!("request timeout: {}", e)
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    format!("transport failure: {}", e)
                };
                log::error!(
                    "{} (attempt {})",
                    MinerError::TransportError(detail.clone()),
                    attempt_index
                );
                return Attempt::Retry(detail);
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            return match response.json::<SubmitResponse>().await {
                Ok(body) if body.success => Attempt::Accepted(BlockAccepted {
                    final_reward: body.final_reward,
                    new_balance: body.new_balance,
                    block_number: body.block_number,
                    power_level: body.power_level.unwrap_or_else(|| "low".to_string()),
                }),
                Ok(body) => {
                    let message = body
                        .error
                        .unwrap_or_else(|| "unspecified rejection".to_string());
                    self.stats.record_rejection();
                    log::error!("Block rejected (attempt {}): {}", attempt_index, message);
                    match permanent_rejection(&message) {
                        Some(error) => Attempt::Fatal(error),
                        None => Attempt::Retry(message),
                    }
                }
                Err(e) => {
                    self.stats.record_network_error();
                    let detail = format!("invalid JSON response: {}", e);
                    log::error!(
                        "{} (attempt {})",
                        MinerError::ProtocolError(detail.clone()),
                        attempt_index
                    );
                    Attempt::Retry(detail)
                }
            };
        }

        if status == StatusCode::CONFLICT {
            self.stats.record_rejection();
            let error = MinerError::DuplicateError("ledger already holds this block".to_string());
            log::warn!("{} (attempt {})", error, attempt_index);
            return Attempt::Fatal(error);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::RateLimited;
        }

        self.stats.record_network_error();
        let detail = format!("server returned status {}", status);
        log::error!(
            "{} (attempt {})",
            MinerError::ProtocolError(detail.clone()),
            attempt_index
        );
        Attempt::Retry(detail)
    }
}

/// Classifies a ledger rejection message that no retry can fix
///
/// Contention keywords (the ledger already holds equivalent work) map to
/// [`MinerError::DuplicateError`]; work the ledger deems unusable maps to
/// [`MinerError::RejectionError`]. Anything else is worth another try.
fn permanent_rejection(message: &str) -> Option<MinerError> {
    let lower = message.to_lowercase();
    if ["duplicate", "already submitted", "exists"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Some(MinerError::DuplicateError(message.to_string()))
    } else if ["invalid hash", "expired"].iter().any(|k| lower.contains(k)) {
        Some(MinerError::RejectionError(message.to_string()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keywords_are_case_insensitive_substrings() {
        assert!(matches!(
            permanent_rejection("Duplicate block"),
            Some(MinerError::DuplicateError(_))
        ));
        assert!(matches!(
            permanent_rejection("block ALREADY SUBMITTED by peer"),
            Some(MinerError::DuplicateError(_))
        ));
        assert!(matches!(
            permanent_rejection("Invalid hash for difficulty"),
            Some(MinerError::RejectionError(_))
        ));
        assert!(matches!(
            permanent_rejection("candidate expired"),
            Some(MinerError::RejectionError(_))
        ));
        assert!(permanent_rejection("server busy, try later").is_none());
    }
}
