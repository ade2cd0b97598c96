// src/stats/reporter.rs
use crate::network::api::SystemInfo;
use crate::stats::aggregator::StatsAggregator;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;

/// Statistics related to hardware utilization
#[derive(Debug, Clone, Copy)]
pub struct HardwareStats {
    /// Current CPU usage percentage (0-100)
    pub cpu_usage: f32,
    /// Current memory usage percentage (0-100)
    pub memory_usage: f32,
}

/// Periodic reporter for mining and hardware statistics
///
/// Owns a [`sysinfo`] handle for CPU/memory sampling and reads mining
/// counters from the shared [`StatsAggregator`]. The report itself is a
/// single structured log line so it composes with whatever log collector
/// is in front of stdout.
pub struct StatsReporter {
    stats: Arc<StatsAggregator>,
    system: System,
    report_interval: Duration,
}

impl StatsReporter {
    /// Creates a new reporter bound to the shared aggregator
    ///
    /// # Arguments
    /// * `stats` - The shared statistics record
    /// * `report_interval` - How often [`start_reporting`] logs a line
    ///
    /// [`start_reporting`]: StatsReporter::start_reporting
    pub fn new(stats: Arc<StatsAggregator>, report_interval: Duration) -> Self {
        StatsReporter {
            stats,
            system: System::new_all(),
            report_interval,
        }
    }

    /// Samples current hardware utilization
    ///
    /// Refreshes CPU and memory readings before returning.
    pub fn get_hardware_stats(&mut self) -> HardwareStats {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();

        let cpus = self.system.cpus();
        let cpu_usage = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        let total = self.system.total_memory();
        let memory_usage = if total == 0 {
            0.0
        } else {
            self.system.used_memory() as f32 / total as f32 * 100.0
        };

        HardwareStats {
            cpu_usage,
            memory_usage,
        }
    }

    /// Builds the `system_info` payload attached to submissions
    pub fn system_info(&mut self, threads: usize) -> SystemInfo {
        let hw = self.get_hardware_stats();
        SystemInfo {
            threads,
            cpu_usage: hw.cpu_usage,
            memory_usage: hw.memory_usage,
        }
    }

    /// Starts the periodic reporting of statistics
    ///
    /// Spawns a background thread that logs a stats line at the
    /// configured interval for the life of the process.
    pub fn start_reporting(&self) {
        let stats = self.stats.clone();
        let interval = self.report_interval;

        std::thread::spawn(move || {
            let mut system = System::new_all();
            loop {
                std::thread::sleep(interval);

                system.refresh_cpu_all();
                system.refresh_memory();
                let cpus = system.cpus();
                let cpu_usage = if cpus.is_empty() {
                    0.0
                } else {
                    cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
                };

                let snap = stats.snapshot();
                log::info!(
                    "Rate: {} (best {}) | Accepted/Rejected: {}/{} ({:.1}%) | Net errors: {} | \
                     Hashes: {} | Earnings: {:.8} | Balance: {:.8} | Power: {} | CPU: {:.1}%",
                    format_hashrate(snap.hash_rate),
                    format_hashrate(snap.best_hash_rate),
                    snap.accepted_blocks,
                    snap.rejected_blocks,
                    snap.success_rate(),
                    snap.network_errors,
                    snap.total_hashes,
                    snap.total_earnings,
                    snap.current_balance,
                    snap.power_level,
                    cpu_usage,
                );
            }
        });
    }
}

/// Formats a hash rate with a metric unit suffix
pub fn format_hashrate(rate: f64) -> String {
    if rate >= 1_000_000_000.0 {
        format!("{:.2} GH/s", rate / 1_000_000_000.0)
    } else if rate >= 1_000_000.0 {
        format!("{:.2} MH/s", rate / 1_000_000.0)
    } else if rate >= 1_000.0 {
        format!("{:.2} KH/s", rate / 1_000.0)
    } else {
        format!("{:.0} H/s", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashrate_units() {
        assert_eq!(format_hashrate(950.0), "950 H/s");
        assert_eq!(format_hashrate(1_500.0), "1.50 KH/s");
        assert_eq!(format_hashrate(2_000_000.0), "2.00 MH/s");
        assert_eq!(format_hashrate(3_500_000_000.0), "3.50 GH/s");
    }
}
