//! Shared test doubles for the ledger-facing integration tests

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use pow_miner_rs::config::{ServerConfig, SubmitConfig};
use pow_miner_rs::miner::scheduler::Solution;
use pow_miner_rs::network::api::{ApiClient, SystemInfo};
use pow_miner_rs::network::submit::SubmissionPipeline;
use pow_miner_rs::stats::StatsAggregator;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted stand-in for the remote ledger
///
/// Answers each POST with the next queued `(status, body)` pair and
/// counts how many submissions it saw. Once the script is exhausted it
/// keeps answering with a retryable rejection so a runaway retry loop
/// fails assertions instead of hanging.
#[derive(Clone)]
pub struct ScriptedLedger {
    responses: Arc<Mutex<VecDeque<(u16, String)>>>,
    hits: Arc<AtomicUsize>,
}

impl ScriptedLedger {
    /// Number of POSTs the ledger has answered
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn respond(State(ledger): State<ScriptedLedger>, _body: String) -> (StatusCode, String) {
    ledger.hits.fetch_add(1, Ordering::SeqCst);
    let next = ledger.responses.lock().unwrap().pop_front();
    match next {
        Some((code, body)) => (
            StatusCode::from_u16(code).expect("scripted status code"),
            body,
        ),
        None => (
            StatusCode::OK,
            r#"{"success":false,"error":"script exhausted"}"#.to_string(),
        ),
    }
}

async fn probe() -> (StatusCode, String) {
    (
        StatusCode::OK,
        r#"{"status":"online","server":"scripted","version":"1.0"}"#.to_string(),
    )
}

/// Spawns the scripted ledger on an ephemeral port
///
/// Returns the base URL to point an [`ApiClient`] at, plus the script
/// handle for hit-count assertions.
pub async fn spawn_ledger(responses: &[(u16, &str)]) -> (String, ScriptedLedger) {
    let ledger = ScriptedLedger {
        responses: Arc::new(Mutex::new(
            responses
                .iter()
                .map(|(code, body)| (*code, body.to_string()))
                .collect(),
        )),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/api", post(respond).get(probe))
        .with_state(ledger.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), ledger)
}

/// Builds a pipeline pointed at a scripted ledger
pub fn make_pipeline(
    base_url: &str,
    stats: Arc<StatsAggregator>,
    submit: &SubmitConfig,
) -> SubmissionPipeline {
    let server = ServerConfig {
        base_url: base_url.to_string(),
        api_secret: "secret".to_string(),
        timeout_secs: 5,
    };
    let api = ApiClient::new(&server).unwrap();
    SubmissionPipeline::new(api, stats, 42, submit)
}

/// Retry policy with no linear backoff, for fast tests
pub fn fast_submit() -> SubmitConfig {
    SubmitConfig {
        retry_attempts: 5,
        retry_delay_ms: 0,
        rate_limit_backoff_ms: 0,
    }
}

/// A plausible solution for submission tests
pub fn test_solution() -> Solution {
    Solution {
        hash: "00c0ffee".repeat(8),
        nonce: 123_456,
        worker_id: 0,
        hashes_computed: 123_456,
        elapsed: Duration::from_millis(250),
    }
}

/// A fixed hardware snapshot for submission tests
pub fn test_system_info() -> SystemInfo {
    SystemInfo {
        threads: 2,
        cpu_usage: 12.5,
        memory_usage: 40.0,
    }
}
