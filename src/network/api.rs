// src/network/api.rs
//! Ledger service client
//!
//! All wire-format knowledge for the remote HTTP/JSON ledger lives here:
//! the connectivity probe, login and identity check, and the submission
//! POST. Classification of submission responses is the pipeline's job;
//! this client only moves payloads.

use crate::config::ServerConfig;
use crate::miner::scheduler::Solution;
use crate::utils::error::MinerError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Client version string reported to the ledger
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response to the connectivity probe (`GET <api>`)
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeResponse {
    /// Expected to be `"online"` for a healthy ledger
    pub status: String,
    /// Server identifier, if reported
    #[serde(default)]
    pub server: Option<String>,
    /// API version, if reported
    #[serde(default)]
    pub version: Option<String>,
    /// Server load percentage, if reported
    #[serde(default)]
    pub server_load: Option<f64>,
}

/// Static client details sent with the login call
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo {
    /// Configured search worker count
    pub threads: usize,
    /// Logical cores on this host
    pub cpu_count: usize,
    /// Operating system identifier
    pub platform: &'static str,
}

impl ClientInfo {
    /// Builds client info for this host and worker count
    pub fn new(threads: usize) -> Self {
        ClientInfo {
            threads,
            cpu_count: num_cpus::get(),
            platform: std::env::consts::OS,
        }
    }
}

/// An authenticated ledger session
#[derive(Debug, Clone)]
pub struct LedgerSession {
    /// Server-assigned account id, attached to every submission
    pub user_id: u64,
    /// Account name as the server knows it
    pub username: String,
    /// Balance at session start
    pub balance: f64,
    /// Lifetime earnings at session start
    pub total_mined: f64,
}

/// Hardware utilization snapshot attached to submissions
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    /// Configured search worker count
    pub threads: usize,
    /// CPU usage percentage at submission time
    pub cpu_usage: f32,
    /// Memory usage percentage at submission time
    pub memory_usage: f32,
}

/// Ledger-reported result of an accepted submission
#[derive(Debug, Clone)]
pub struct BlockAccepted {
    /// Reward granted for this block
    pub final_reward: f64,
    /// Account balance after the reward was applied
    pub new_balance: f64,
    /// Height the block was recorded at
    pub block_number: u64,
    /// Server-assigned tier for this account
    pub power_level: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    action: &'static str,
    username: &'a str,
    password: &'a str,
    client_version: &'static str,
    client_info: &'a ClientInfo,
}

#[derive(Debug, Serialize)]
struct StatsRequest {
    action: &'static str,
    user_id: u64,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    user_id: Option<u64>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    balance: f64,
    #[serde(default)]
    total_mined: f64,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    balance: f64,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    user_id: u64,
    block_hash: &'a str,
    nonce: u64,
    difficulty: u32,
    hash_rate: u64,
    api_secret: &'a str,
    client_version: &'static str,
    system_info: &'a SystemInfo,
}

/// Raw body of a submission response; classified by the pipeline
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Whether the ledger accepted the block
    #[serde(default)]
    pub success: bool,
    /// Rejection detail when `success` is false
    #[serde(default)]
    pub error: Option<String>,
    /// Reward granted on acceptance
    #[serde(default)]
    pub final_reward: f64,
    /// Balance after the reward was applied
    #[serde(default)]
    pub new_balance: f64,
    /// Height the block was recorded at
    #[serde(default)]
    pub block_number: u64,
    /// Server-assigned account tier
    #[serde(default)]
    pub power_level: Option<String>,
}

/// HTTP client for the remote ledger service
pub struct ApiClient {
    http: Client,
    api_url: String,
    api_secret: String,
}

impl ApiClient {
    /// Creates a client for the configured ledger endpoint
    ///
    /// # Errors
    /// Returns `MinerError` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &ServerConfig) -> Result<Self, MinerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("pow_miner-rs/{}", CLIENT_VERSION))
            .build()?;

        Ok(ApiClient {
            http,
            api_url: config.api_url(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Endpoint this client talks to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Checks that the ledger is reachable and reports itself online
    ///
    /// # Errors
    /// - `TransportError` when the endpoint cannot be reached
    /// - `ProtocolError` on a non-200 status, malformed body, or a
    ///   ledger that does not report `status = "online"`
    pub async fn probe(&self) -> Result<ProbeResponse, MinerError> {
        let started = Instant::now();
        let response = self.http.get(&self.api_url).send().await.map_err(|e| {
            MinerError::TransportError(format!("cannot reach {}: {}", self.api_url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MinerError::ProtocolError(format!(
                "probe returned status {}",
                status
            )));
        }

        let probe: ProbeResponse = response
            .json()
            .await
            .map_err(|e| MinerError::ProtocolError(format!("invalid probe response: {}", e)))?;

        if probe.status != "online" {
            return Err(MinerError::ProtocolError(format!(
                "ledger reports status '{}'",
                probe.status
            )));
        }

        log::info!(
            "Ledger online ({} ms): server={} version={}",
            started.elapsed().as_millis(),
            probe.server.as_deref().unwrap_or("unknown"),
            probe.version.as_deref().unwrap_or("1.0"),
        );
        if let Some(load) = probe.server_load {
            log::info!("Server load: {:.0}%", load);
        }

        Ok(probe)
    }

    /// Authenticates against the ledger
    ///
    /// # Errors
    /// - `RejectionError` when the ledger answers `success = false`
    /// - `ProtocolError` on a non-200 status or a success body without a
    ///   user id
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client_info: &ClientInfo,
    ) -> Result<LedgerSession, MinerError> {
        let request = LoginRequest {
            action: "login",
            username,
            password,
            client_version: CLIENT_VERSION,
            client_info,
        };

        let response = self.http.post(&self.api_url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MinerError::ProtocolError(format!(
                "login returned status {}",
                status
            )));
        }

        let body: LoginResponse = response.json().await?;
        if !body.success {
            return Err(MinerError::RejectionError(
                body.error.unwrap_or_else(|| "login failed".to_string()),
            ));
        }

        let user_id = body
            .user_id
            .ok_or_else(|| MinerError::ProtocolError("login response missing user_id".into()))?;

        Ok(LedgerSession {
            user_id,
            username: body.username.unwrap_or_else(|| username.to_string()),
            balance: body.balance,
            total_mined: body.total_mined,
        })
    }

    /// Re-validates a known user id and returns the current balance
    ///
    /// # Errors
    /// - `RejectionError` when the ledger no longer knows the user
    /// - `ProtocolError` on a non-200 status or malformed body
    pub async fn get_stats(&self, user_id: u64) -> Result<f64, MinerError> {
        let request = StatsRequest {
            action: "get_stats",
            user_id,
        };

        let response = self.http.post(&self.api_url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MinerError::ProtocolError(format!(
                "get_stats returned status {}",
                status
            )));
        }

        let body: StatsResponse = response.json().await?;
        if !body.success {
            return Err(MinerError::RejectionError(
                body.error.unwrap_or_else(|| "unknown user".to_string()),
            ));
        }

        Ok(body.balance)
    }

    /// Posts one solution to the ledger
    ///
    /// Returns the raw response; status and body classification is done
    /// by the submission pipeline so retry policy stays in one place.
    pub async fn submit_block(
        &self,
        user_id: u64,
        solution: &Solution,
        difficulty: u32,
        hash_rate: u64,
        system_info: &SystemInfo,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let request = SubmitRequest {
            user_id,
            block_hash: &solution.hash,
            nonce: solution.nonce,
            difficulty,
            hash_rate,
            api_secret: &self.api_secret,
            client_version: CLIENT_VERSION,
            system_info,
        };

        self.http.post(&self.api_url).json(&request).send().await
    }
}
