// src/miner/worker.rs
//! Worker implementation
//!
//! Scans an assigned nonce sub-range in increasing order, batch by batch,
//! and returns the first digest that meets the round difficulty. Checks
//! the shared cancellation token between batches and credits computed
//! hashes to the shared counters in batched increments.

use crate::miner::algorithm::{self, Algorithm};
use crate::miner::scheduler::{NonceRange, Solution};
use crate::stats::StatsAggregator;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// One round's search task for a single thread
///
/// Built by the scheduler once per round per worker; the hash variant is
/// resolved by the scheduler beforehand so every worker of a round hashes
/// with the same algorithm.
pub struct Worker {
    /// Index of this worker within the round's pool
    pub(crate) id: usize,
    /// Opaque payload being mined, concatenated with the decimal nonce
    pub(crate) block_data: String,
    /// Hash variant resolved for this round
    pub(crate) algorithm: Arc<dyn Algorithm>,
    /// Nonce window assigned to this worker
    pub(crate) range: NonceRange,
    /// Required count of leading zero hex characters
    pub(crate) difficulty: u32,
    /// Nonces processed between cancellation checks
    pub(crate) batch_size: u64,
    /// CPU usage ceiling in percent; below 100 adds a sleep per batch
    pub(crate) cpu_limit: u32,
    /// Round-wide cooperative cancellation token
    pub(crate) cancel: Arc<AtomicBool>,
    /// Shared counters credited with computed hashes
    pub(crate) stats: Arc<StatsAggregator>,
}

impl Worker {
    /// Scans the assigned range and returns the first valid solution
    ///
    /// Returns `None` on range exhaustion or cancellation. Hash counts
    /// for completed batches (and the partial batch of a winning scan)
    /// are credited before returning, so abandoned work still shows up
    /// in the session totals.
    pub fn run(&self) -> Option<Solution> {
        let started = Instant::now();
        let end = self.range.start.saturating_add(self.range.size);
        let mut nonce = self.range.start;
        let mut computed: u64 = 0;

        while nonce < end {
            if self.cancel.load(Ordering::Relaxed) {
                log::debug!("worker {} cancelled at nonce {}", self.id, nonce);
                return None;
            }

            let batch_end = end.min(nonce.saturating_add(self.batch_size));
            for candidate in nonce..batch_end {
                let digest = self.algorithm.hash(&self.block_data, candidate);
                computed += 1;
                if algorithm::meets_difficulty(&digest, self.difficulty) {
                    self.stats.add_hashes(candidate - nonce + 1);
                    return Some(Solution {
                        hash: digest,
                        nonce: candidate,
                        worker_id: self.id,
                        hashes_computed: computed,
                        elapsed: started.elapsed(),
                    });
                }
            }
            self.stats.add_hashes(batch_end - nonce);
            nonce = batch_end;

            if self.cpu_limit < 100 {
                std::thread::sleep(Duration::from_micros(
                    10 * (100 - self.cpu_limit) as u64,
                ));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlgorithmType;

    fn worker(data: &str, start: u64, size: u64, difficulty: u32) -> (Worker, Arc<StatsAggregator>) {
        let stats = Arc::new(StatsAggregator::new());
        let worker = Worker {
            id: 0,
            block_data: data.to_string(),
            algorithm: algorithm::create(AlgorithmType::Sha256),
            range: NonceRange { start, size },
            difficulty,
            batch_size: 10,
            cpu_limit: 100,
            cancel: Arc::new(AtomicBool::new(false)),
            stats: stats.clone(),
        };
        (worker, stats)
    }

    #[test]
    fn finds_first_valid_nonce_in_order() {
        // sha256("test25") is the first digest over "test" with a leading zero
        let (worker, stats) = worker("test", 0, 100, 1);
        let solution = worker.run().expect("a solution exists in range");
        assert_eq!(solution.nonce, 25);
        assert!(solution.hash.starts_with('0'));
        assert_eq!(solution.hashes_computed, 26);
        // two full batches plus the partial winning batch
        assert_eq!(stats.snapshot().total_hashes, 26);
    }

    #[test]
    fn exhaustion_credits_whole_range() {
        // no digest over "test" in [226, 266) has a leading zero
        let (worker, stats) = worker("test", 226, 40, 1);
        assert!(worker.run().is_none());
        assert_eq!(stats.snapshot().total_hashes, 40);
    }

    #[test]
    fn cancellation_stops_the_scan() {
        let (worker, stats) = worker("test", 0, 1_000_000, 64);
        worker.cancel.store(true, Ordering::Relaxed);
        assert!(worker.run().is_none());
        assert_eq!(stats.snapshot().total_hashes, 0);
    }
}
