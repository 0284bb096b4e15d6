//! Live search statistics

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use saltmine_pattern::{estimate_time_50pct, format_difficulty, format_duration};

/// Salt counter and run flag shared by all lanes of one search
#[derive(Debug)]
pub struct SearchStats {
    salts: AtomicU64,
    started: Instant,
    running: AtomicBool,
}

impl SearchStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            salts: AtomicU64::new(0),
            started: Instant::now(),
            running: AtomicBool::new(true),
        })
    }

    pub fn add_salts(&self, count: u64) {
        self.salts.fetch_add(count, Ordering::Relaxed);
    }

    pub fn total_salts(&self) -> u64 {
        self.salts.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn salts_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.total_salts() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask every lane to finish its current batch and exit
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// One-line progress for the stderr printer
    pub fn status_line(&self, difficulty: f64) -> String {
        let rate = self.salts_per_second();
        format!(
            "[{:.2} Msalt/s][Total {}][50% in {}]",
            rate / 1_000_000.0,
            format_difficulty(self.total_salts() as f64),
            format_duration(estimate_time_50pct(difficulty, rate))
        )
    }
}
