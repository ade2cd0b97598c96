// src/cli/mod.rs
//! Command-line interface definitions
//!
//! Clap derive structs for the miner's subcommands. Parsing happens in
//! `main.rs`; configuration overrides are applied there as well.

/// Subcommand and option definitions
pub mod commands;

// Re-export for easier access
pub use commands::{
    Action, BenchmarkOptions, Commands, ConfigOptions, ProbeOptions, StartOptions,
};
