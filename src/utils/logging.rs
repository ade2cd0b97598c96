// src/utils/logging.rs
//! Logging configuration
//!
//! env_logger setup shared by the mining and benchmark entry points.
//! One line per event on stdout: timestamp, level, module, line, message.
//! `RUST_LOG` overrides the per-mode default level.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes logging for normal mining runs
///
/// Defaults to `Info` unless `RUST_LOG` is set.
pub fn init_logging() {
    init_with_default(LevelFilter::Info);
}

/// Initializes logging for benchmark runs
///
/// Benchmarks default to `Debug` so per-thread rate lines show up
/// without extra flags; `RUST_LOG` still wins when set.
pub fn init_bench_logging() {
    init_with_default(LevelFilter::Debug);
}

fn init_with_default(level: LevelFilter) {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.module_path().unwrap_or_default(),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(Target::Stdout);

    if env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        builder.filter_level(level);
    }

    builder.init();
}
