use saltmine_core::{Create2Search, SearchConfig};
use tracing::{debug, info};

use super::SearchEngine;
use crate::cancel::SearchControl;
use crate::error::{DeployError, Result};
use crate::job::{SearchJob, SearchSolution, WorkerReport};

/// Runs the CREATE2 search on a rayon pool inside this process
#[derive(Debug, Clone)]
pub struct InProcessEngine {
    batch_size: usize,
    show_progress: bool,
    write_reports: bool,
}

impl Default for InProcessEngine {
    fn default() -> Self {
        Self {
            batch_size: SearchConfig::default().batch_size,
            show_progress: false,
            write_reports: false,
        }
    }
}

impl InProcessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Print live statistics to stderr while searching
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Also write a [`WorkerReport`] to each job's output path
    pub fn with_reports(mut self, write_reports: bool) -> Self {
        self.write_reports = write_reports;
        self
    }
}

impl SearchEngine for InProcessEngine {
    fn name(&self) -> &str {
        "in-process"
    }

    fn search(&self, job: &SearchJob, control: &SearchControl) -> Result<SearchSolution> {
        if control.cancel.is_cancelled() {
            return Err(DeployError::Cancelled);
        }

        let label = job.contract_label();
        let failure = |reason: String| DeployError::WorkerExecutionFailure {
            label: label.to_string(),
            reason,
        };

        if self.write_reports && job.output_path().exists() {
            debug!("Removing stale output {}", job.output_path().display());
            std::fs::remove_file(job.output_path())
                .map_err(|e| failure(format!("cannot remove stale output: {}", e)))?;
        }

        let config = SearchConfig {
            threads: job.worker_concurrency(),
            batch_size: self.batch_size,
            max_attempts: 0,
            max_time: control.deadline,
            show_progress: self.show_progress,
        };

        let search = Create2Search::new(
            job.factory(),
            job.init_code_hash().as_bytes(),
            vec![job.target().clone()],
            config,
        )
        .map_err(|e| failure(e.to_string()))?;

        let result = search
            .run_until(control.cancel.as_flag())
            .map_err(|e| failure(e.to_string()))?;

        let Some(result) = result else {
            if control.cancel.is_cancelled() {
                return Err(DeployError::Cancelled);
            }
            return Err(match control.deadline {
                Some(deadline) => DeployError::SearchTimedOut {
                    label: label.to_string(),
                    after: deadline,
                },
                None => failure("search ended without a match".into()),
            });
        };

        info!(
            "{}: found {} after {} attempts ({:.2}s)",
            label,
            result.address_hex(),
            result.attempts,
            result.time_secs
        );

        let solution = SearchSolution::from_result(&result);
        if self.write_reports {
            WorkerReport::new(job, solution.clone()).write_to(job.output_path())?;
        }
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::init_code::InitCodeHash;
    use saltmine_core::Pattern;
    use saltmine_crypto::{create2_address, parse_fixed_hex};
    use std::path::Path;
    use std::time::Duration;

    const FACTORY: [u8; 20] = [0x11; 20];

    fn job(pattern: Pattern, output: &Path) -> SearchJob {
        SearchJob::new(
            FACTORY,
            InitCodeHash::of(&[0x60, 0x01, 0x60, 0x01, 0x55]),
            pattern,
            "Foo",
            2,
            output,
        )
    }

    #[test]
    fn test_finds_verifiable_solution() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("vanity_foo.json");
        let job = job(Pattern::suffix("7").case_insensitive(), &output);

        let engine = InProcessEngine::new().with_batch_size(64).with_reports(true);
        let solution = engine.search(&job, &SearchControl::default()).unwrap();

        let salt = parse_fixed_hex::<32>(&solution.salt).unwrap();
        let address = parse_fixed_hex::<20>(&solution.address).unwrap();
        assert_eq!(create2_address(&FACTORY, &salt, job.init_code_hash().as_bytes()), address);
        assert!(solution.address.ends_with('7'));

        let written = crate::job::read_solution("Foo", &output).unwrap();
        assert_eq!(written, solution);
    }

    #[test]
    fn test_prefix_and_suffix_both_hold() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(
            Pattern::prefix("a").with_suffix("7").case_insensitive(),
            &dir.path().join("out.json"),
        );

        let solution = InProcessEngine::new()
            .with_batch_size(64)
            .search(&job, &SearchControl::default())
            .unwrap();

        let address = solution.address.to_ascii_lowercase();
        assert!(address.starts_with("0xa"));
        assert!(address.ends_with('7'));
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(Pattern::suffix("7"), &dir.path().join("out.json"));
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = InProcessEngine::new().search(&job, &SearchControl::new(cancel, None));
        assert!(matches!(result, Err(DeployError::Cancelled)));
    }

    #[test]
    fn test_deadline_expires() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(Pattern::prefix("0".repeat(40)), &dir.path().join("out.json"));
        let control = SearchControl::new(CancelToken::new(), Some(Duration::from_millis(200)));

        let started = std::time::Instant::now();
        let result = InProcessEngine::new().with_batch_size(64).search(&job, &control);

        assert!(matches!(
            result,
            Err(DeployError::SearchTimedOut { after, .. }) if after == Duration::from_millis(200)
        ));
        assert!(started.elapsed() < Duration::from_millis(900));
    }
}
