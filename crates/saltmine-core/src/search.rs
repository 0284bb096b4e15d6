//! CREATE2 salt search engine

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use saltmine_crypto::{eip55_checksum, hex, to_prefixed_hex, Create2Input};
use saltmine_pattern::{calculate_difficulty, Pattern, PatternError, PatternMatcher};

use crate::stats::SearchStats;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    #[error("No pattern given")]
    NoPattern,
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of threads (0 = auto)
    pub threads: usize,
    /// Salts per lane between limit checks
    pub batch_size: usize,
    /// Maximum attempts (0 = unlimited)
    pub max_attempts: u64,
    /// Wall-clock limit (`None` = unlimited)
    pub max_time: Option<Duration>,
    /// Print live statistics to stderr
    pub show_progress: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: 0, // Auto-detect
            batch_size: 1000,
            max_attempts: 0,
            max_time: None,
            show_progress: false,
        }
    }
}

impl SearchConfig {
    /// Resolved lane count
    pub fn lanes(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

/// Search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The matching deployment address
    pub address: [u8; 20],
    /// The salt that produces it
    pub salt: [u8; 32],
    /// Total salts tested across all lanes
    pub attempts: u64,
    /// Time taken in seconds
    pub time_secs: f64,
    /// Salts per second achieved
    pub salts_per_second: f64,
}

impl SearchResult {
    /// EIP-55 rendering of the address
    pub fn address_hex(&self) -> String {
        eip55_checksum(&self.address)
    }

    /// `0x`-prefixed lowercase salt
    pub fn salt_hex(&self) -> String {
        to_prefixed_hex(&self.salt)
    }
}

/// CREATE2 vanity search over a fixed factory and init code hash
pub struct Create2Search {
    input: Create2Input,
    matcher: PatternMatcher,
    config: SearchConfig,
    difficulty: f64,
    checksum_case: bool,
}

impl Create2Search {
    /// Create a new search. Every pattern is validated up front.
    pub fn new(
        factory: &[u8; 20],
        init_code_hash: &[u8; 32],
        patterns: Vec<Pattern>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        let first = patterns.first().ok_or(SearchError::NoPattern)?;
        for pattern in &patterns {
            pattern.validate()?;
        }

        // Difficulty is reported for the first pattern
        let difficulty = calculate_difficulty(first);
        let matcher = PatternMatcher::new(patterns);
        let checksum_case = matcher.needs_checksum_case();

        Ok(Self {
            input: Create2Input::new(factory, init_code_hash),
            matcher,
            config,
            difficulty,
            checksum_case,
        })
    }

    /// Get the search difficulty (expected attempts)
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    /// Get the search configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the search (blocking until found or limits reached)
    pub fn run(&self) -> Result<Option<SearchResult>, SearchError> {
        self.run_until(&AtomicBool::new(false))
    }

    /// Run the search until found, limits reached, or `stop` is raised.
    ///
    /// Returns `Ok(None)` when the search ended without a match.
    pub fn run_until(&self, stop: &AtomicBool) -> Result<Option<SearchResult>, SearchError> {
        self.run_with_stats(stop, &SearchStats::new())
    }

    /// Like [`Self::run_until`], counting into caller-owned statistics
    pub fn run_with_stats(
        &self,
        stop: &AtomicBool,
        stats: &Arc<SearchStats>,
    ) -> Result<Option<SearchResult>, SearchError> {

        // Channel for results
        let (tx, rx): (Sender<([u8; 20], [u8; 32])>, Receiver<([u8; 20], [u8; 32])>) =
            bounded(1);

        let printer_handle = if self.config.show_progress {
            let stats_for_printer = stats.clone();
            let difficulty = self.difficulty;
            Some(thread::spawn(move || {
                while stats_for_printer.is_running() {
                    eprint!("\r{}", stats_for_printer.status_line(difficulty));
                    thread::sleep(Duration::from_millis(250));
                }
                eprintln!(); // New line after stats
            }))
        } else {
            None
        };

        let num_threads = self.config.lanes();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| SearchError::ThreadPool(e.to_string()))?;

        let batch_size = self.config.batch_size.max(1);
        let max_attempts = self.config.max_attempts;
        let max_time = self.config.max_time;

        info!(
            lanes = num_threads,
            difficulty = self.difficulty,
            "Starting CREATE2 salt search"
        );

        pool.install(|| {
            (0..num_threads).into_par_iter().for_each(|lane| {
                // Bytes 0-23 random per lane, bytes 24-31 a counter
                let mut salt: [u8; 32] = rand::random();
                let mut counter = 0u64;
                debug!(lane, base = %hex::encode(&salt[..24]), "Lane started");

                while stats.is_running() {
                    if stop.load(Ordering::Relaxed) {
                        stats.stop();
                        break;
                    }
                    if max_attempts > 0 && stats.total_salts() >= max_attempts {
                        stats.stop();
                        break;
                    }
                    if max_time.is_some_and(|limit| stats.elapsed() >= limit) {
                        stats.stop();
                        break;
                    }

                    let mut tested = 0u64;
                    for _ in 0..batch_size {
                        salt[24..32].copy_from_slice(&counter.to_be_bytes());
                        counter = counter.wrapping_add(1);
                        tested += 1;

                        let address = self.input.address(&salt);
                        if self.is_match(&address) {
                            stats.add_salts(tested);
                            let _ = tx.try_send((address, salt));
                            stats.stop();
                            return;
                        }
                    }

                    stats.add_salts(tested);
                }
            });
        });

        // Wait for printer thread
        stats.stop();
        if let Some(handle) = printer_handle {
            let _ = handle.join();
        }

        Ok(rx.try_recv().ok().map(|(address, salt)| SearchResult {
            address,
            salt,
            attempts: stats.total_salts(),
            time_secs: stats.elapsed().as_secs_f64(),
            salts_per_second: stats.salts_per_second(),
        }))
    }

    fn is_match(&self, address: &[u8; 20]) -> bool {
        if self.checksum_case {
            return self.matcher.matches(&eip55_checksum(address)).is_some();
        }

        let mut buf = [0u8; 40];
        if hex::encode_to_slice(address, &mut buf).is_err() {
            return false;
        }
        match std::str::from_utf8(&buf) {
            Ok(lower) => self.matcher.matches(lower).is_some(),
            Err(_) => false,
        }
    }
}
