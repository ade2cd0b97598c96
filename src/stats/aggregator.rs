// src/stats/aggregator.rs
//! Lock-guarded mining statistics
//!
//! One shared record, one lock. Workers credit hash counts, the scheduler
//! and difficulty controller feed the rolling rate window, and the
//! submission pipeline applies accept/reject outcomes. Compound updates
//! happen under a single lock acquisition so readers never observe a
//! half-applied acceptance.

use crate::network::api::BlockAccepted;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Maximum number of per-round hash rates kept for difficulty tuning
pub const RATE_WINDOW: usize = 10;

/// Immutable snapshot of the mining session statistics
///
/// Derived metrics (success rate, blocks/hour, earnings/hour) are methods
/// on the snapshot so they are always computed from one consistent copy,
/// never from interleaved reads of the live record.
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Total hashes computed across all rounds and workers
    pub total_hashes: u64,
    /// Submissions accepted by the ledger
    pub accepted_blocks: u64,
    /// Submissions the ledger rejected at the application level
    pub rejected_blocks: u64,
    /// Blocks mined this session (tracks accepted submissions)
    pub blocks_mined: u64,
    /// Transport- and protocol-level submission failures
    pub network_errors: u64,
    /// Hash rate of the most recent successful round (H/s)
    pub hash_rate: f64,
    /// Best per-round hash rate seen this session (H/s)
    pub best_hash_rate: f64,
    /// Most recent per-round hash rates, oldest first (≤ [`RATE_WINDOW`])
    pub rolling_rates: Vec<f64>,
    /// When the last block was accepted
    pub last_block_time: Option<Instant>,
    /// Mean wall-clock time between accepted blocks
    pub average_block_time: Duration,
    /// Rewards accumulated this session
    pub total_earnings: f64,
    /// Balance as last reported by the ledger, never computed locally
    pub current_balance: f64,
    /// Difficulty currently in effect
    pub difficulty: u32,
    /// Server-assigned tier from the last accepted submission
    pub power_level: String,
    /// Time since the aggregator was created
    pub uptime: Duration,
}

impl MiningStats {
    /// Accepted submissions as a percentage of all resolved submissions
    pub fn success_rate(&self) -> f64 {
        let total = self.accepted_blocks + self.rejected_blocks;
        if total == 0 {
            return 0.0;
        }
        self.accepted_blocks as f64 / total as f64 * 100.0
    }

    /// Session-average hash rate in H/s
    pub fn average_hash_rate(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.total_hashes as f64 / secs
    }

    /// Accepted blocks per hour of uptime
    pub fn blocks_per_hour(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.accepted_blocks as f64 / secs * 3600.0
    }

    /// Session earnings per hour of uptime
    pub fn earnings_per_hour(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.total_earnings / secs * 3600.0
    }
}

#[derive(Debug)]
struct StatsInner {
    total_hashes: u64,
    accepted_blocks: u64,
    rejected_blocks: u64,
    blocks_mined: u64,
    network_errors: u64,
    hash_rate: f64,
    best_hash_rate: f64,
    rolling_rates: VecDeque<f64>,
    last_block_time: Option<Instant>,
    average_block_time: Duration,
    total_earnings: f64,
    current_balance: f64,
    difficulty: u32,
    power_level: String,
}

/// Shared, mutex-guarded statistics record
///
/// The only object shared across worker threads and the submission
/// pipeline. Every mutation takes the one lock; [`snapshot`] returns an
/// immutable copy for reporting.
///
/// [`snapshot`]: StatsAggregator::snapshot
pub struct StatsAggregator {
    inner: Mutex<StatsInner>,
    started: Instant,
}

impl StatsAggregator {
    /// Creates a fresh aggregator with all counters at zero
    pub fn new() -> Self {
        StatsAggregator {
            inner: Mutex::new(StatsInner {
                total_hashes: 0,
                accepted_blocks: 0,
                rejected_blocks: 0,
                blocks_mined: 0,
                network_errors: 0,
                hash_rate: 0.0,
                best_hash_rate: 0.0,
                rolling_rates: VecDeque::with_capacity(RATE_WINDOW),
                last_block_time: None,
                average_block_time: Duration::ZERO,
                total_earnings: 0.0,
                current_balance: 0.0,
                difficulty: 0,
                power_level: "low".to_string(),
            }),
            started: Instant::now(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatsInner> {
        // A worker panic mid-update cannot leave a half-applied compound
        // write (all writes are plain field stores), so recover the data.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Credits `count` computed hashes to the session total
    ///
    /// Workers call this once per batch rather than per hash; batching
    /// reduces lock traffic without losing updates.
    pub fn add_hashes(&self, count: u64) {
        self.lock().total_hashes += count;
    }

    /// Records the hash rate of a completed round
    ///
    /// Updates the current and best rate and appends to the rolling
    /// window, evicting the oldest entry once the window holds
    /// [`RATE_WINDOW`] samples.
    pub fn record_round_rate(&self, rate: f64) {
        let mut inner = self.lock();
        inner.hash_rate = rate;
        if rate > inner.best_hash_rate {
            inner.best_hash_rate = rate;
        }
        inner.rolling_rates.push_back(rate);
        while inner.rolling_rates.len() > RATE_WINDOW {
            inner.rolling_rates.pop_front();
        }
    }

    /// Returns the rolling window size and mean rate in one read
    pub fn rolling_window(&self) -> (usize, f64) {
        let inner = self.lock();
        let len = inner.rolling_rates.len();
        if len == 0 {
            return (0, 0.0);
        }
        let mean = inner.rolling_rates.iter().sum::<f64>() / len as f64;
        (len, mean)
    }

    /// Records the difficulty currently in effect
    pub fn set_difficulty(&self, difficulty: u32) {
        self.lock().difficulty = difficulty;
    }

    /// Seeds balance and lifetime earnings from a login response
    pub fn set_account(&self, balance: f64, total_earned: f64) {
        let mut inner = self.lock();
        inner.current_balance = balance;
        inner.total_earnings = total_earned;
    }

    /// Replaces the balance with a value reported by the ledger
    pub fn set_balance(&self, balance: f64) {
        self.lock().current_balance = balance;
    }

    /// Applies an accepted submission in one atomic compound update
    ///
    /// Touches acceptance counters, last-block time, earnings, the
    /// server-reported balance and tier, and (once more than one block has
    /// been accepted) the mean block time.
    pub fn apply_acceptance(&self, accepted: &BlockAccepted) {
        let mut inner = self.lock();
        inner.accepted_blocks += 1;
        inner.blocks_mined += 1;
        inner.last_block_time = Some(Instant::now());
        inner.total_earnings += accepted.final_reward;
        inner.current_balance = accepted.new_balance;
        inner.power_level = accepted.power_level.clone();
        if inner.accepted_blocks > 1 {
            let elapsed = self.started.elapsed().as_secs_f64();
            inner.average_block_time =
                Duration::from_secs_f64(elapsed / inner.accepted_blocks as f64);
        }
    }

    /// Counts an application-level rejection from the ledger
    pub fn record_rejection(&self) {
        self.lock().rejected_blocks += 1;
    }

    /// Counts a transport- or protocol-level submission failure
    pub fn record_network_error(&self) {
        self.lock().network_errors += 1;
    }

    /// Returns an immutable copy of the current statistics
    pub fn snapshot(&self) -> MiningStats {
        let inner = self.lock();
        MiningStats {
            total_hashes: inner.total_hashes,
            accepted_blocks: inner.accepted_blocks,
            rejected_blocks: inner.rejected_blocks,
            blocks_mined: inner.blocks_mined,
            network_errors: inner.network_errors,
            hash_rate: inner.hash_rate,
            best_hash_rate: inner.best_hash_rate,
            rolling_rates: inner.rolling_rates.iter().copied().collect(),
            last_block_time: inner.last_block_time,
            average_block_time: inner.average_block_time,
            total_earnings: inner.total_earnings,
            current_balance: inner.current_balance,
            difficulty: inner.difficulty,
            power_level: inner.power_level.clone(),
            uptime: self.started.elapsed(),
        }
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(reward: f64, balance: f64) -> BlockAccepted {
        BlockAccepted {
            final_reward: reward,
            new_balance: balance,
            block_number: 1,
            power_level: "medium".to_string(),
        }
    }

    #[test]
    fn rolling_window_evicts_oldest() {
        let stats = StatsAggregator::new();
        for i in 0..11 {
            stats.record_round_rate(i as f64);
        }
        let snap = stats.snapshot();
        assert_eq!(snap.rolling_rates.len(), RATE_WINDOW);
        // the 11th insertion pushed out the first sample (0.0)
        assert_eq!(snap.rolling_rates[0], 1.0);
        assert_eq!(*snap.rolling_rates.last().unwrap(), 10.0);
    }

    #[test]
    fn rolling_mean() {
        let stats = StatsAggregator::new();
        stats.record_round_rate(100.0);
        stats.record_round_rate(300.0);
        let (len, mean) = stats.rolling_window();
        assert_eq!(len, 2);
        assert_eq!(mean, 200.0);
    }

    #[test]
    fn best_rate_is_monotonic() {
        let stats = StatsAggregator::new();
        stats.record_round_rate(500.0);
        stats.record_round_rate(200.0);
        let snap = stats.snapshot();
        assert_eq!(snap.hash_rate, 200.0);
        assert_eq!(snap.best_hash_rate, 500.0);
    }

    #[test]
    fn acceptance_applies_compound_update() {
        let stats = StatsAggregator::new();
        stats.apply_acceptance(&accepted(1.5, 10.5));
        let snap = stats.snapshot();
        assert_eq!(snap.accepted_blocks, 1);
        assert_eq!(snap.blocks_mined, 1);
        assert_eq!(snap.total_earnings, 1.5);
        assert_eq!(snap.current_balance, 10.5);
        assert_eq!(snap.power_level, "medium");
        assert!(snap.last_block_time.is_some());
        // single acceptance leaves the mean untouched
        assert_eq!(snap.average_block_time, Duration::ZERO);
    }

    #[test]
    fn balance_is_replaced_not_accumulated() {
        let stats = StatsAggregator::new();
        stats.apply_acceptance(&accepted(1.0, 5.0));
        stats.apply_acceptance(&accepted(2.0, 7.0));
        let snap = stats.snapshot();
        assert_eq!(snap.total_earnings, 3.0);
        assert_eq!(snap.current_balance, 7.0);
        assert!(snap.average_block_time > Duration::ZERO);
    }

    #[test]
    fn derived_metrics_come_from_one_snapshot() {
        let stats = StatsAggregator::new();
        stats.apply_acceptance(&accepted(1.0, 5.0));
        stats.record_rejection();
        let snap = stats.snapshot();
        assert_eq!(snap.success_rate(), 50.0);
    }

    #[test]
    fn hash_counter_accumulates_batches() {
        let stats = StatsAggregator::new();
        stats.add_hashes(1000);
        stats.add_hashes(234);
        assert_eq!(stats.snapshot().total_hashes, 1234);
    }
}
