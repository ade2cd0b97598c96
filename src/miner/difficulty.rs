// src/miner/difficulty.rs
//! Adaptive difficulty controller
//!
//! Tunes the leading-zero requirement from a rolling window of per-round
//! hash rates. A hysteresis band between the raise and lower thresholds
//! keeps the difficulty from oscillating round to round.

use crate::config::AutoDifficultyConfig;
use crate::stats::StatsAggregator;
use std::sync::Arc;

/// Adjusts difficulty from the rolling hash-rate window
///
/// The window itself lives in the shared [`StatsAggregator`]; the
/// controller owns only the tuning policy. Invoked once per successfully
/// mined round, after that round's rate has been recorded.
pub struct DifficultyController {
    stats: Arc<StatsAggregator>,
    enabled: bool,
    min_samples: usize,
    raise_threshold: f64,
    lower_threshold: f64,
    min_difficulty: u32,
    max_difficulty: u32,
}

impl DifficultyController {
    /// Creates a controller with the configured thresholds and bounds
    pub fn new(stats: Arc<StatsAggregator>, config: &AutoDifficultyConfig) -> Self {
        DifficultyController {
            stats,
            enabled: config.enabled,
            min_samples: config.min_samples,
            raise_threshold: config.raise_threshold,
            lower_threshold: config.lower_threshold,
            min_difficulty: config.min_difficulty,
            max_difficulty: config.max_difficulty,
        }
    }

    /// Records a completed round's hash rate into the rolling window
    pub fn record_rate(&self, rate: f64) {
        self.stats.record_round_rate(rate);
    }

    /// Returns the difficulty to use for the next round
    ///
    /// No change while auto-tuning is disabled, while fewer than
    /// `min_samples` rounds have been recorded, or while the window mean
    /// sits inside the hysteresis band. Raises by one below the cap when
    /// the mean exceeds the raise threshold; lowers by one above the
    /// floor when it falls under the lower threshold.
    pub fn maybe_adjust(&self, difficulty: u32) -> u32 {
        if !self.enabled {
            return difficulty;
        }

        let (samples, mean) = self.stats.rolling_window();
        if samples < self.min_samples {
            return difficulty;
        }

        if mean > self.raise_threshold && difficulty < self.max_difficulty {
            let next = difficulty + 1;
            log::info!("Difficulty increased to {} (mean rate {:.0} H/s)", next, mean);
            self.stats.set_difficulty(next);
            next
        } else if mean < self.lower_threshold && difficulty > self.min_difficulty {
            let next = difficulty - 1;
            log::info!("Difficulty decreased to {} (mean rate {:.0} H/s)", next, mean);
            self.stats.set_difficulty(next);
            next
        } else {
            difficulty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(enabled: bool) -> DifficultyController {
        let config = AutoDifficultyConfig {
            enabled,
            ..AutoDifficultyConfig::default()
        };
        DifficultyController::new(Arc::new(StatsAggregator::new()), &config)
    }

    fn feed(controller: &DifficultyController, rate: f64, rounds: usize) {
        for _ in 0..rounds {
            controller.record_rate(rate);
        }
    }

    #[test]
    fn cold_start_requires_five_samples() {
        let controller = controller(true);
        feed(&controller, 5_000_000.0, 4);
        assert_eq!(controller.maybe_adjust(5), 5);
        controller.record_rate(5_000_000.0);
        assert_eq!(controller.maybe_adjust(5), 6);
    }

    #[test]
    fn raises_up_to_the_cap() {
        let controller = controller(true);
        feed(&controller, 2_000_000.0, 10);
        let mut difficulty = 7;
        difficulty = controller.maybe_adjust(difficulty);
        assert_eq!(difficulty, 8);
        // already at the cap
        assert_eq!(controller.maybe_adjust(difficulty), 8);
    }

    #[test]
    fn lowers_down_to_the_floor() {
        let controller = controller(true);
        feed(&controller, 50_000.0, 10);
        let mut difficulty = 4;
        difficulty = controller.maybe_adjust(difficulty);
        assert_eq!(difficulty, 3);
        // already at the floor
        assert_eq!(controller.maybe_adjust(difficulty), 3);
    }

    #[test]
    fn band_is_a_no_op() {
        let controller = controller(true);
        feed(&controller, 500_000.0, 10);
        assert_eq!(controller.maybe_adjust(5), 5);
    }

    #[test]
    fn disabled_never_adjusts() {
        let controller = controller(false);
        feed(&controller, 9_000_000.0, 10);
        assert_eq!(controller.maybe_adjust(5), 5);
    }
}
