// src/miner/scheduler.rs
//! Mining round scheduler
//!
//! Owns a persistent pool of worker threads and, per round, hands each
//! one a nonce window over the candidate payload. The round is a race to
//! the first valid solution: the winner is returned immediately and the
//! shared cancellation token stops the rest at their next batch boundary.

use crate::config::MinerConfig;
use crate::miner::algorithm::Algorithm;
use crate::miner::worker::Worker;
use crate::stats::StatsAggregator;
use crate::utils::error::MinerError;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rand::Rng;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Opaque payload for one mining round
///
/// Supplied by an external generator; the scheduler treats `data` as an
/// uninterpreted byte sequence and discards the candidate when the round
/// ends.
#[derive(Debug, Clone)]
pub struct BlockCandidate {
    /// Payload hashed together with the decimal nonce
    pub data: String,
    /// Required count of leading zero hex characters
    pub difficulty: u32,
}

/// A worker's assigned search window
#[derive(Debug, Clone, Copy)]
pub struct NonceRange {
    /// First nonce of the window
    pub start: u64,
    /// Number of nonces in the window
    pub size: u64,
}

/// A hash meeting the round difficulty, found by one worker
#[derive(Debug, Clone)]
pub struct Solution {
    /// Winning digest as lowercase hex
    pub hash: String,
    /// Nonce that produced the digest
    pub nonce: u64,
    /// Index of the worker that found it
    pub worker_id: usize,
    /// Hashes the winning worker computed this round
    pub hashes_computed: u64,
    /// Time the winning worker spent searching
    pub elapsed: Duration,
}

/// One round's work order for a pool thread: the worker to run and where
/// to deliver its result. A fresh result channel per round means a late
/// result from an abandoned round has nowhere to go.
type Assignment = (Worker, Sender<Option<Solution>>);

/// Coordinates rounds of nonce search across a persistent worker pool
///
/// The pool is spawned once at construction, sized to the configured
/// thread count capped at the logical core count; only the nonce range
/// assignment changes per round. Dropping the scheduler closes the
/// assignment channels and the pool threads exit.
pub struct Scheduler {
    /// Shared counters credited by workers
    stats: Arc<StatsAggregator>,
    /// One assignment channel per pool thread
    assignments: Vec<Sender<Assignment>>,
    /// Nonces assigned to each worker per round
    range_size: u64,
    /// Nonces processed between cancellation checks
    batch_size: u64,
    /// CPU usage ceiling handed to workers
    cpu_limit: u32,
    /// Upper bound for the per-worker random start offset
    jitter_max: u64,
    /// Wall-clock ceiling for one round
    round_timeout: Duration,
}

impl Scheduler {
    /// Creates a scheduler and spawns its worker pool
    ///
    /// The configured thread count is capped at the number of logical
    /// cores.
    pub fn new(stats: Arc<StatsAggregator>, config: &MinerConfig) -> Self {
        let workers = config.threads.clamp(1, num_cpus::get());
        let assignments = (0..workers)
            .map(|id| {
                let (sender, receiver) = crossbeam_channel::unbounded::<Assignment>();
                std::thread::spawn(move || worker_loop(id, receiver));
                sender
            })
            .collect();

        Scheduler {
            stats,
            assignments,
            range_size: config.nonce_range,
            batch_size: config.batch_size,
            cpu_limit: config.cpu_limit,
            jitter_max: config.jitter_max,
            round_timeout: Duration::from_secs(config.round_timeout_secs),
        }
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.assignments.len()
    }

    /// Runs one round of search over `candidate`
    ///
    /// Hands every pool thread a window and waits for the first non-empty
    /// result: the winner is returned immediately and the cancellation
    /// token is set for the rest, without waiting for their
    /// acknowledgment. Worker *i* scans `[i * range_size + jitter, ..
    /// + range_size)`; the random jitter means adjacent windows may
    /// overlap, so two workers can both find a valid hash. Only the
    /// first-observed solution is kept; the ledger re-validates
    /// independently.
    ///
    /// Returns `None` when every worker exhausts its window or the round
    /// timeout elapses. Hash counts already credited stay credited.
    pub fn search(
        &self,
        candidate: &BlockCandidate,
        algorithm: Arc<dyn Algorithm>,
    ) -> Option<Solution> {
        log::info!(
            "Mining with {} workers (difficulty {}, algorithm {})",
            self.assignments.len(),
            candidate.difficulty,
            algorithm.kind()
        );

        let started = Instant::now();
        let cancel = Arc::new(AtomicBool::new(false));
        let (results_sender, results) = crossbeam_channel::unbounded();
        let mut rng = rand::thread_rng();
        let mut dispatched = 0;

        for (id, assignments) in self.assignments.iter().enumerate() {
            let jitter = if self.jitter_max > 0 {
                rng.gen_range(0..self.jitter_max)
            } else {
                0
            };
            let worker = Worker {
                id,
                block_data: candidate.data.clone(),
                algorithm: algorithm.clone(),
                range: NonceRange {
                    start: id as u64 * self.range_size + jitter,
                    size: self.range_size,
                },
                difficulty: candidate.difficulty,
                batch_size: self.batch_size,
                cpu_limit: self.cpu_limit,
                cancel: cancel.clone(),
                stats: self.stats.clone(),
            };
            if assignments.send((worker, results_sender.clone())).is_ok() {
                dispatched += 1;
            } else {
                log::warn!("Pool thread {} is gone, skipping its window", id);
            }
        }
        drop(results_sender);

        let deadline = started + self.round_timeout;
        let mut finished = 0;
        while finished < dispatched {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match results.recv_timeout(remaining) {
                Ok(Some(solution)) => {
                    cancel.store(true, Ordering::Relaxed);
                    log::info!(
                        "Block found by worker {}: {}... (nonce {}, {:.2}s)",
                        solution.worker_id,
                        &solution.hash[..16.min(solution.hash.len())],
                        solution.nonce,
                        solution.elapsed.as_secs_f64()
                    );
                    return Some(solution);
                }
                Ok(None) => finished += 1,
                Err(RecvTimeoutError::Timeout) => {
                    cancel.store(true, Ordering::Relaxed);
                    log::info!(
                        "No solution within {}s, abandoning round",
                        self.round_timeout.as_secs()
                    );
                    return None;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        log::info!(
            "Search space exhausted ({} nonces), requesting new work",
            dispatched as u64 * self.range_size
        );
        None
    }
}

/// Pool thread body: runs assignments until the scheduler goes away
///
/// A panic inside a worker is caught here, logged as a worker fault, and
/// treated as an empty result; it never takes the thread or the round
/// down with it.
fn worker_loop(id: usize, assignments: Receiver<Assignment>) {
    for (worker, results) in assignments {
        let found = match panic::catch_unwind(AssertUnwindSafe(|| worker.run())) {
            Ok(found) => found,
            Err(payload) => {
                let fault = MinerError::WorkerFault(format!(
                    "worker {}: {}",
                    id,
                    panic_message(&payload)
                ));
                log::error!("{}", fault);
                None
            }
        };
        // the receiver is gone if the round was already decided
        let _ = results.send(found);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::algorithm;
    use crate::types::AlgorithmType;

    fn config(threads: usize, range: u64, timeout_secs: u64) -> MinerConfig {
        MinerConfig {
            threads,
            nonce_range: range,
            batch_size: 10,
            jitter_max: 0,
            cpu_limit: 100,
            round_timeout_secs: timeout_secs,
            ..MinerConfig::default()
        }
    }

    #[test]
    fn returns_exactly_one_solution_when_all_workers_hit() {
        // difficulty 0 makes every digest valid: each worker finds a
        // solution at the first nonce of its window, and the race keeps
        // only the first-observed one
        let stats = Arc::new(StatsAggregator::new());
        let scheduler = Scheduler::new(stats.clone(), &config(2, 50, 30));
        let candidate = BlockCandidate {
            data: "race".to_string(),
            difficulty: 0,
        };
        let solution = scheduler
            .search(&candidate, algorithm::create(AlgorithmType::Sha256))
            .expect("trivial difficulty always solves");
        assert!(solution.nonce == 0 || solution.nonce == 50);
        assert!(stats.snapshot().total_hashes >= 1);
    }

    #[test]
    fn exhaustion_returns_none() {
        let stats = Arc::new(StatsAggregator::new());
        let scheduler = Scheduler::new(stats.clone(), &config(1, 40, 30));
        // no 40-nonce window satisfies 12 leading zeros
        let candidate = BlockCandidate {
            data: "test".to_string(),
            difficulty: 12,
        };
        assert!(
            scheduler
                .search(&candidate, algorithm::create(AlgorithmType::Sha256))
                .is_none()
        );
        assert_eq!(stats.snapshot().total_hashes, 40);
    }

    #[test]
    fn timeout_abandons_the_round() {
        let stats = Arc::new(StatsAggregator::new());
        let scheduler = Scheduler::new(stats, &config(1, u64::MAX / 4, 0));
        let candidate = BlockCandidate {
            data: "slow".to_string(),
            difficulty: 60,
        };
        let started = Instant::now();
        assert!(
            scheduler
                .search(&candidate, algorithm::create(AlgorithmType::Sha256))
                .is_none()
        );
        // a zero-second ceiling trips on the first wait
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn pool_survives_across_rounds() {
        let stats = Arc::new(StatsAggregator::new());
        let scheduler = Scheduler::new(stats, &config(2, 50, 30));
        let algorithm = algorithm::create(AlgorithmType::Sha256);
        for _ in 0..3 {
            let candidate = BlockCandidate {
                data: "again".to_string(),
                difficulty: 0,
            };
            assert!(scheduler.search(&candidate, algorithm.clone()).is_some());
        }
        assert!(scheduler.worker_count() >= 1);
    }

    #[test]
    fn worker_count_is_capped_at_cores() {
        let stats = Arc::new(StatsAggregator::new());
        let scheduler = Scheduler::new(stats, &config(10_000, 10, 1));
        assert!(scheduler.worker_count() <= num_cpus::get());
    }
}
