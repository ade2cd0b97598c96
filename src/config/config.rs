// src/config/config.rs
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the mining application
///
/// Groups the ledger endpoint, search parameters, difficulty auto-tuning
/// policy, submission retry policy, and credentials. Every field has a
/// default so a minimal config file only needs the values that differ.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ledger service endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Nonce search parameters
    #[serde(default)]
    pub miner: MinerConfig,

    /// Difficulty auto-tuning policy
    #[serde(default)]
    pub auto_difficulty: AutoDifficultyConfig,

    /// Submission retry policy
    #[serde(default)]
    pub submit: SubmitConfig,

    /// Ledger credentials
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Ledger service endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the ledger service; the API lives under `<base>/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Shared secret attached to every submission
    #[serde(default)]
    pub api_secret: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServerConfig {
    /// Full API endpoint URL
    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            base_url: default_base_url(),
            api_secret: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Nonce search parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Hash variant (sha256, sha1, md5)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Number of search workers (capped at logical cores)
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Nonces assigned to each worker per round
    #[serde(default = "default_nonce_range")]
    pub nonce_range: u64,

    /// Nonces processed between cancellation checks
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Required count of leading zero hex characters
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,

    /// Upper bound for the per-worker random start offset
    #[serde(default = "default_jitter_max")]
    pub jitter_max: u64,

    /// CPU usage ceiling in percent (100 disables throttling)
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit: u32,

    /// Wall-clock ceiling for one round, in seconds
    #[serde(default = "default_round_timeout")]
    pub round_timeout_secs: u64,
}

impl MinerConfig {
    /// Parses the configured hash variant
    pub fn algorithm(&self) -> Result<AlgorithmType, MinerError> {
        self.algorithm
            .parse()
            .map_err(|_| MinerError::ConfigError(format!("Invalid algorithm: {}", self.algorithm)))
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            algorithm: default_algorithm(),
            threads: default_threads(),
            nonce_range: default_nonce_range(),
            batch_size: default_batch_size(),
            difficulty: default_difficulty(),
            jitter_max: default_jitter_max(),
            cpu_limit: default_cpu_limit(),
            round_timeout_secs: default_round_timeout(),
        }
    }
}

/// Difficulty auto-tuning policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoDifficultyConfig {
    /// Whether the controller may change the difficulty at all
    #[serde(default)]
    pub enabled: bool,

    /// Rounds required in the rolling window before any adjustment
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Mean H/s above which the difficulty is raised
    #[serde(default = "default_raise_threshold")]
    pub raise_threshold: f64,

    /// Mean H/s below which the difficulty is lowered
    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: f64,

    /// Lowest difficulty the controller will set
    #[serde(default = "default_min_difficulty")]
    pub min_difficulty: u32,

    /// Highest difficulty the controller will set
    #[serde(default = "default_max_difficulty")]
    pub max_difficulty: u32,
}

impl Default for AutoDifficultyConfig {
    fn default() -> Self {
        AutoDifficultyConfig {
            enabled: false,
            min_samples: default_min_samples(),
            raise_threshold: default_raise_threshold(),
            lower_threshold: default_lower_threshold(),
            min_difficulty: default_min_difficulty(),
            max_difficulty: default_max_difficulty(),
        }
    }
}

/// Submission retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// Maximum submission attempts per solution
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base retry delay in milliseconds; attempt k waits k times this
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause after an HTTP 429 before retrying, in milliseconds
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        SubmitConfig {
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
        }
    }
}

/// Ledger credentials
///
/// Either a username/password pair for a login call, or a known user id
/// that skips login. Interactive prompting is deliberately not part of
/// this client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Account name for the login call
    #[serde(default)]
    pub username: Option<String>,

    /// Account password for the login call
    #[serde(default)]
    pub password: Option<String>,

    /// Known user id; skips the login call when set
    #[serde(default)]
    pub user_id: Option<u64>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_algorithm() -> String {
    "sha256".into()
}

fn default_threads() -> usize {
    num_cpus::get()
}

fn default_nonce_range() -> u64 {
    2_000_000
}

fn default_batch_size() -> u64 {
    50_000
}

fn default_difficulty() -> u32 {
    5
}

fn default_jitter_max() -> u64 {
    100_000
}

fn default_cpu_limit() -> u32 {
    80
}

fn default_round_timeout() -> u64 {
    120
}

fn default_min_samples() -> usize {
    5
}

fn default_raise_threshold() -> f64 {
    1_000_000.0
}

fn default_lower_threshold() -> f64 {
    100_000.0
}

fn default_min_difficulty() -> u32 {
    3
}

fn default_max_difficulty() -> u32 {
    8
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_rate_limit_backoff_ms() -> u64 {
    5_000
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_str)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks configured values for consistency
    ///
    /// # Errors
    /// Returns `ConfigError` when the base URL does not parse, the
    /// algorithm is unknown, or a numeric bound is out of range.
    pub fn validate(&self) -> Result<(), MinerError> {
        url::Url::parse(&self.server.base_url).map_err(|e| {
            MinerError::ConfigError(format!("Invalid base_url '{}': {}", self.server.base_url, e))
        })?;
        self.miner.algorithm()?;
        if self.miner.threads == 0 {
            return Err(MinerError::ConfigError("threads must be at least 1".into()));
        }
        if self.miner.batch_size == 0 || self.miner.nonce_range == 0 {
            return Err(MinerError::ConfigError(
                "nonce_range and batch_size must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.miner.cpu_limit) {
            return Err(MinerError::ConfigError(
                "cpu_limit must be between 1 and 100".into(),
            ));
        }
        if self.submit.retry_attempts == 0 {
            return Err(MinerError::ConfigError(
                "retry_attempts must be at least 1".into(),
            ));
        }
        if self.auto_difficulty.min_difficulty > self.auto_difficulty.max_difficulty {
            return Err(MinerError::ConfigError(
                "min_difficulty must not exceed max_difficulty".into(),
            ));
        }
        Ok(())
    }

    /// Generates a configuration template string
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template() -> String {
        let mut template = String::new();
        template.push_str("# Miner configuration\n\n");
        template.push_str("[server]\n");
        template.push_str("# Ledger service base URL; the API is served under <base_url>/api\n");
        template.push_str("base_url = \"http://127.0.0.1:8080\"\n");
        template.push_str("# Shared secret attached to every submission\n");
        template.push_str("api_secret = \"\"\n");
        template.push_str("# HTTP request timeout in seconds\n");
        template.push_str("timeout_secs = 30\n\n");

        template.push_str("[miner]\n");
        template.push_str("# Supported algorithms: sha256, sha1, md5\n");
        template.push_str("algorithm = \"sha256\"\n");
        template.push_str("# Search workers (capped at logical cores)\n");
        template.push_str("threads = 4\n");
        template.push_str("# Nonces per worker per round\n");
        template.push_str("nonce_range = 2000000\n");
        template.push_str("# Nonces between cancellation checks\n");
        template.push_str("batch_size = 50000\n");
        template.push_str("# Leading zero hex characters required\n");
        template.push_str("difficulty = 5\n");
        template.push_str("# Upper bound of the random per-worker start offset\n");
        template.push_str("jitter_max = 100000\n");
        template.push_str("# CPU usage ceiling in percent (100 = no throttling)\n");
        template.push_str("cpu_limit = 80\n");
        template.push_str("# Per-round wall clock ceiling in seconds\n");
        template.push_str("round_timeout_secs = 120\n\n");

        template.push_str("[auto_difficulty]\n");
        template.push_str("enabled = false\n");
        template.push_str("min_samples = 5\n");
        template.push_str("raise_threshold = 1000000.0\n");
        template.push_str("lower_threshold = 100000.0\n");
        template.push_str("min_difficulty = 3\n");
        template.push_str("max_difficulty = 8\n\n");

        template.push_str("[submit]\n");
        template.push_str("retry_attempts = 5\n");
        template.push_str("retry_delay_ms = 2000\n");
        template.push_str("rate_limit_backoff_ms = 5000\n\n");

        template.push_str("[auth]\n");
        template.push_str("# Either username + password, or a known user_id\n");
        template.push_str("username = \"miner1\"\n");
        template.push_str("password = \"secret\"\n");
        template.push_str("# user_id = 123\n");

        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.miner.difficulty, 5);
        assert_eq!(config.submit.retry_attempts, 5);
        assert_eq!(config.auto_difficulty.min_samples, 5);
        assert!(!config.auto_difficulty.enabled);
    }

    #[test]
    fn template_parses_back() {
        let template = Config::generate_template();
        let config: Config = toml::from_str(&template).expect("template must be valid TOML");
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.username.as_deref(), Some("miner1"));
    }

    #[test]
    fn loads_partial_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[miner]\ndifficulty = 3\nthreads = 2").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.miner.difficulty, 3);
        assert_eq!(config.miner.threads, 2);
        // untouched sections keep their defaults
        assert_eq!(config.submit.retry_delay_ms, 2_000);
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let config: Config = toml::from_str("[miner]\nalgorithm = \"scrypt\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_url_joins_cleanly() {
        let server = ServerConfig {
            base_url: "http://ledger.example/".into(),
            ..ServerConfig::default()
        };
        assert_eq!(server.api_url(), "http://ledger.example/api");
    }
}
