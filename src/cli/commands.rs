// src/cli/commands.rs
use crate::types::AlgorithmType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Proof-of-work mining client for HTTP ledger services
#[derive(Parser, Debug)]
#[command(name = "pow-miner-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (start mining, run benchmarks, probe the
    /// ledger, or generate config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Start mining with specified options
    Start(StartOptions),

    /// Run performance benchmarks for hash variants
    Benchmark(BenchmarkOptions),

    /// Check connectivity to the ledger service
    Probe(ProbeOptions),

    /// Generate a configuration file template
    Config(ConfigOptions),
}

/// Options for starting the mining operation
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of search workers to use (overrides config)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Leading-zero difficulty to mine at (overrides config)
    #[arg(short, long)]
    pub difficulty: Option<u32>,

    /// Hash variant to use (overrides config)
    #[arg(short, long)]
    pub algorithm: Option<AlgorithmType>,

    /// Enable difficulty auto-tuning
    #[arg(long)]
    pub auto_difficulty: bool,

    /// CPU usage ceiling in percent (overrides config)
    #[arg(long)]
    pub cpu_limit: Option<u32>,

    /// Ledger base URL (overrides config)
    #[arg(long)]
    pub url: Option<String>,

    /// Known user id; skips the login call
    #[arg(long)]
    pub user_id: Option<u64>,

    /// Account name (with --user-id, or overriding the configured one)
    #[arg(long)]
    pub username: Option<String>,
}

/// Options for running hash benchmarks
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Hash variant to benchmark
    #[arg(short, long, default_value = "sha256")]
    pub algorithm: AlgorithmType,

    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 10)]
    pub duration: u64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,
}

/// Options for the connectivity probe
#[derive(Parser, Debug)]
pub struct ProbeOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Ledger base URL (overrides config)
    #[arg(long)]
    pub url: Option<String>,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,
}
