//! Batch driver

use tracing::{error, info, warn};

use crate::aggregate::{CombinedResult, ResultAggregator};
use crate::cancel::CancelToken;
use crate::config::RunSettings;
use crate::coordinator::Coordinator;
use crate::engine::SearchEngine;
use crate::error::{DeployError, Disposition, Result};
use crate::report::RunReport;

/// Result of a batch that ran to completion
#[derive(Debug)]
pub struct BatchOutcome {
    pub report: RunReport,
    /// Present when at least one contract succeeded
    pub combined: Option<CombinedResult>,
    /// Outcome of writing `combined`. On failure the record is still here and
    /// [`CombinedResult::persist`] may be retried.
    pub persisted: Result<()>,
}

impl BatchOutcome {
    /// At least one contract succeeded and the record is on disk
    pub fn is_success(&self) -> bool {
        self.combined.is_some() && self.persisted.is_ok()
    }
}

/// Process every configured contract in order and persist the combined record.
///
/// Per-contract failures are recorded in the report. Precondition failures
/// and cancellation end the run with an error; nothing is written on
/// cancellation. A failed final write is carried in
/// [`BatchOutcome::persisted`] alongside the results.
pub fn run_batch(settings: &RunSettings, engine: &dyn SearchEngine, cancel: &CancelToken) -> Result<BatchOutcome> {
    let coordinator = Coordinator::new(settings, engine, cancel.clone());
    coordinator.prepare()?;

    let mut report = RunReport::new(settings.contracts());
    let mut aggregator = ResultAggregator::for_run(settings);

    for (i, label) in settings.contracts().iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled);
        }
        info!("[{}/{}] {}", i + 1, settings.contracts().len(), label);

        match coordinator.process(label) {
            Ok(solution) => {
                aggregator.push(label.as_str(), solution)?;
                report.record_success(label);
            }
            Err(err) => match err.disposition() {
                Disposition::Skip => {
                    warn!("{}: {}", label, err);
                    report.record_failure(label, &err);
                }
                Disposition::Integrity => {
                    error!("{}: {}", label, err);
                    report.record_failure(label, &err);
                }
                Disposition::Fatal => return Err(err),
            },
        }
    }

    let combined = aggregator.finish();
    let persisted = match &combined {
        Some(result) => result.persist(settings.output_path()),
        None => {
            error!("No contract produced a verified address, nothing written");
            Ok(())
        }
    };
    if let Err(err) = &persisted {
        error!("{}", err);
    }

    Ok(BatchOutcome {
        report,
        combined,
        persisted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::job::SearchSolution;
    use crate::testing::{foo_solution, write_artifact, StubEngine, FOO_BYTECODE};
    use std::path::Path;

    fn settings(root: &Path, contracts: &[&str]) -> RunSettings {
        RunConfig {
            network: "testnet".into(),
            contracts: contracts.iter().map(|c| c.to_string()).collect(),
            artifacts_dir: root.join("artifacts"),
            work_dir: root.to_path_buf(),
            ..Default::default()
        }
        .settings()
        .unwrap()
    }

    #[test]
    fn test_partial_success() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("artifacts");
        write_artifact(&artifacts, "Foo", FOO_BYTECODE);
        write_artifact(&artifacts, "Bar", FOO_BYTECODE);
        write_artifact(&artifacts, "Broken", "0x600");
        let settings = settings(dir.path(), &["Bar", "Broken", "Missing", "Foo"]);

        let engine = StubEngine::new(|_, _| Ok(foo_solution()));
        let outcome = run_batch(&settings, &engine, &CancelToken::new()).unwrap();

        assert_eq!(outcome.report.succeeded(), ["Bar", "Foo"]);
        assert_eq!(outcome.report.missing(), ["Broken", "Missing"]);
        assert_eq!(outcome.report.skipped().len(), 2);

        let written = CombinedResult::load(settings.output_path()).unwrap();
        assert_eq!(written.contracts().labels().collect::<Vec<_>>(), ["Bar", "Foo"]);
        assert_eq!(written.contracts().get("Foo"), Some(&foo_solution()));
        assert_eq!(written.network(), "testnet");
        assert_eq!(written.factory(), "0xAA28020DDA6b954D16208eccF873D79AC6533833");
        assert_eq!(written.timestamp(), foo_solution().timestamp);
        assert!(outcome.is_success());
        assert_eq!(Some(written), outcome.combined);
    }

    #[test]
    fn test_failed_write_keeps_results() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(&dir.path().join("artifacts"), "Foo", FOO_BYTECODE);
        let settings = RunConfig {
            contracts: vec!["Foo".into()],
            artifacts_dir: dir.path().join("artifacts"),
            work_dir: dir.path().to_path_buf(),
            output: "no_such_dir/combined.json".into(),
            ..Default::default()
        }
        .settings()
        .unwrap();

        let engine = StubEngine::new(|_, _| Ok(foo_solution()));
        let outcome = run_batch(&settings, &engine, &CancelToken::new()).unwrap();

        assert!(matches!(outcome.persisted, Err(DeployError::PersistenceFailure { .. })));
        assert!(!outcome.is_success());
        assert_eq!(outcome.report.succeeded(), ["Foo"]);

        let combined = outcome.combined.expect("verified results stay in memory");
        assert_eq!(combined.contracts().get("Foo"), Some(&foo_solution()));

        std::fs::create_dir(dir.path().join("no_such_dir")).unwrap();
        combined.persist(settings.output_path()).unwrap();
        assert_eq!(CombinedResult::load(settings.output_path()).unwrap(), combined);
    }

    #[test]
    fn test_integrity_failure_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("artifacts");
        write_artifact(&artifacts, "Foo", FOO_BYTECODE);
        write_artifact(&artifacts, "Bar", FOO_BYTECODE);
        let settings = settings(dir.path(), &["Foo", "Bar"]);

        let engine = StubEngine::new(|job, _| {
            if job.contract_label() == "Foo" {
                Ok(SearchSolution {
                    address: "0x000000000000000000000000000000000000c777".into(),
                    ..foo_solution()
                })
            } else {
                Ok(foo_solution())
            }
        });
        let outcome = run_batch(&settings, &engine, &CancelToken::new()).unwrap();

        assert_eq!(outcome.report.integrity_failed().len(), 1);
        assert_eq!(outcome.report.integrity_failed()[0].0, "Foo");
        let combined = outcome.combined.unwrap();
        assert!(!combined.contracts().contains("Foo"));
        assert!(combined.contracts().contains("Bar"));
    }

    #[test]
    fn test_zero_successes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(&dir.path().join("artifacts"), "Foo", FOO_BYTECODE);
        let settings = settings(dir.path(), &["Foo", "Bar"]);

        let engine = StubEngine::new(|job, _| {
            Err(DeployError::WorkerExecutionFailure {
                label: job.contract_label().to_string(),
                reason: "exit status: 1".into(),
            })
        });
        let outcome = run_batch(&settings, &engine, &CancelToken::new()).unwrap();

        assert!(outcome.report.is_total_failure());
        assert!(outcome.combined.is_none());
        assert!(!outcome.is_success());
        assert!(!settings.output_path().exists());
    }

    #[test]
    fn test_cancellation_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("artifacts");
        write_artifact(&artifacts, "Foo", FOO_BYTECODE);
        write_artifact(&artifacts, "Bar", FOO_BYTECODE);
        let settings = settings(dir.path(), &["Foo", "Bar"]);
        let cancel = CancelToken::new();

        let engine = StubEngine::new(|_, control| {
            control.cancel.cancel();
            Ok(foo_solution())
        });
        let result = run_batch(&settings, &engine, &cancel);

        assert!(matches!(result, Err(DeployError::Cancelled)));
        assert!(cancel.is_cancelled());
        assert!(!settings.output_path().exists());
    }

    #[test]
    fn test_missing_artifact_dir_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &["Foo"]);
        let engine = StubEngine::new(|_, _| Ok(foo_solution()));

        assert!(matches!(
            run_batch(&settings, &engine, &CancelToken::new()),
            Err(DeployError::PreconditionFailure(_))
        ));
    }
}
