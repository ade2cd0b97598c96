//! End-to-end round: search for a real solution, submit it to a scripted
//! ledger, and check the session statistics afterwards

mod common;

use common::{fast_submit, make_pipeline, spawn_ledger, test_system_info};
use pow_miner_rs::config::MinerConfig;
use pow_miner_rs::miner::algorithm::{self, Algorithm};
use pow_miner_rs::miner::scheduler::{BlockCandidate, Scheduler};
use pow_miner_rs::stats::StatsAggregator;
use pow_miner_rs::types::AlgorithmType;
use std::sync::Arc;

#[tokio::test]
async fn full_round_finds_submits_and_records() {
    let stats = Arc::new(StatsAggregator::new());
    let miner = MinerConfig {
        threads: 2,
        nonce_range: 100_000,
        batch_size: 1_000,
        jitter_max: 0,
        cpu_limit: 100,
        round_timeout_secs: 60,
        ..MinerConfig::default()
    };
    let scheduler = Arc::new(Scheduler::new(stats.clone(), &miner));
    let algorithm = algorithm::create(AlgorithmType::Sha256);

    let candidate = BlockCandidate {
        data: "X".to_string(),
        difficulty: 2,
    };
    let search_scheduler = scheduler.clone();
    let search_algorithm = algorithm.clone();
    let solution =
        tokio::task::spawn_blocking(move || search_scheduler.search(&candidate, search_algorithm))
            .await
            .unwrap()
            .expect("difficulty 2 over 200k nonces must solve");

    assert!(solution.hash.starts_with("00"));
    // the digest must recompute from the winning nonce
    assert_eq!(algorithm.hash("X", solution.nonce), solution.hash);
    assert!(stats.snapshot().total_hashes > 0);

    let (url, ledger) = spawn_ledger(&[(
        200,
        r#"{"success":true,"final_reward":1.5,"new_balance":10.5,"block_number":7,"power_level":"medium"}"#,
    )])
    .await;
    let pipeline = make_pipeline(&url, stats.clone(), &fast_submit());

    let outcome = pipeline
        .submit(&solution, 2, 50_000.0, test_system_info())
        .await;

    assert!(outcome.accepted);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(ledger.hits(), 1);

    let server = outcome.server.expect("acceptance carries server data");
    assert_eq!(server.block_number, 7);
    assert_eq!(server.power_level, "medium");

    let snap = stats.snapshot();
    assert_eq!(snap.accepted_blocks, 1);
    assert_eq!(snap.total_earnings, 1.5);
    assert_eq!(snap.current_balance, 10.5);
    assert_eq!(snap.power_level, "medium");
    assert!(snap.last_block_time.is_some());
}
