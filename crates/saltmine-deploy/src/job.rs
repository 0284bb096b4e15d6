//! Search jobs and the solutions workers hand back

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use saltmine_core::{Pattern, SearchResult};
use saltmine_crypto::eip55_checksum;
use serde::{Deserialize, Serialize};

use crate::aggregate::write_json_atomic;
use crate::error::{DeployError, Result};
use crate::init_code::InitCodeHash;

/// Everything a search engine needs for one contract
#[derive(Debug, Clone)]
pub struct SearchJob {
    factory: [u8; 20],
    init_code_hash: InitCodeHash,
    target: Pattern,
    contract_label: String,
    worker_concurrency: usize,
    output_path: PathBuf,
}

impl SearchJob {
    pub fn new(
        factory: [u8; 20],
        init_code_hash: InitCodeHash,
        target: Pattern,
        contract_label: impl Into<String>,
        worker_concurrency: usize,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            factory,
            init_code_hash,
            target,
            contract_label: contract_label.into(),
            worker_concurrency,
            output_path: output_path.into(),
        }
    }

    pub fn factory(&self) -> &[u8; 20] {
        &self.factory
    }

    /// EIP-55 rendering of the factory
    pub fn factory_hex(&self) -> String {
        eip55_checksum(&self.factory)
    }

    pub fn init_code_hash(&self) -> &InitCodeHash {
        &self.init_code_hash
    }

    pub fn target(&self) -> &Pattern {
        &self.target
    }

    pub fn contract_label(&self) -> &str {
        &self.contract_label
    }

    pub fn worker_concurrency(&self) -> usize {
        self.worker_concurrency
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

/// A salt claimed to produce a matching address. Never trusted until verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSolution {
    pub address: String,
    pub salt: String,
    pub attempts: u64,
    pub duration_seconds: f64,
    pub timestamp: String,
}

impl SearchSolution {
    /// Solution for an in-process search result, stamped with the current time
    pub fn from_result(result: &SearchResult) -> Self {
        Self {
            address: result.address_hex(),
            salt: result.salt_hex(),
            attempts: result.attempts,
            duration_seconds: result.time_secs,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// The per-contract file a worker writes to its `--output` path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub contract_name: String,
    pub factory: String,
    pub init_code_hash: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(flatten)]
    pub solution: SearchSolution,
}

impl WorkerReport {
    pub fn new(job: &SearchJob, solution: SearchSolution) -> Self {
        Self {
            contract_name: job.contract_label().to_string(),
            factory: job.factory_hex(),
            init_code_hash: job.init_code_hash().to_hex(),
            pattern: job.target().digits().to_string(),
            suffix: job.target().suffix_digits().map(str::to_string),
            solution,
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
    }
}

/// Read a worker's output file. Fields beyond the solution are ignored.
pub(crate) fn read_solution(label: &str, path: &Path) -> Result<SearchSolution> {
    let failure = |reason: String| DeployError::WorkerExecutionFailure {
        label: label.to_string(),
        reason,
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| failure(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| failure(format!("invalid output {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution() -> SearchSolution {
        SearchSolution {
            address: "0xB809a426a74Ea8E758a5b7AE72B8a408C7fFC777".into(),
            salt: format!("0x{}27c8", "0".repeat(60)),
            attempts: 42,
            duration_seconds: 1.5,
            timestamp: "2024-01-01T00:00:00.000Z".into(),
        }
    }

    fn job(output: &Path) -> SearchJob {
        SearchJob::new(
            [0xaa; 20],
            InitCodeHash::of(&[0x60, 0x01, 0x60, 0x01, 0x55]),
            Pattern::suffix("777").case_insensitive(),
            "Foo",
            4,
            output,
        )
    }

    #[test]
    fn test_worker_report_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vanity_foo.json");
        let report = WorkerReport::new(&job(&path), solution());
        report.write_to(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["contract_name"], "Foo");
        assert_eq!(value["pattern"], "777");
        assert!(value.get("suffix").is_none());
        assert_eq!(value["attempts"], 42);
        assert_eq!(value["duration_seconds"], 1.5);
        assert_eq!(
            value["init_code_hash"],
            "0xf8b07b083341d3a7667e38718918d301f47d62f82d8186f4ccd7ed7424a64ef3"
        );

        assert_eq!(read_solution("Foo", &path).unwrap(), solution());
    }

    #[test]
    fn test_read_minimal_solution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(
            &path,
            r#"{"address": "0x01", "salt": "0x02", "attempts": 7, "duration_seconds": 0.25, "timestamp": "t", "extra": true}"#,
        )
        .unwrap();

        let solution = read_solution("Foo", &path).unwrap();
        assert_eq!(solution.attempts, 7);
        assert_eq!(solution.address, "0x01");
    }

    #[test]
    fn test_read_missing_or_incomplete_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        assert!(matches!(
            read_solution("Foo", &path),
            Err(DeployError::WorkerExecutionFailure { .. })
        ));

        std::fs::write(&path, r#"{"address": "0x01"}"#).unwrap();
        assert!(matches!(
            read_solution("Foo", &path),
            Err(DeployError::WorkerExecutionFailure { .. })
        ));
    }

    #[test]
    fn test_job_accessors() {
        let job = job(Path::new("/tmp/vanity_foo.json"));
        assert_eq!(job.contract_label(), "Foo");
        assert_eq!(job.worker_concurrency(), 4);
        assert_eq!(job.target().digits(), "777");
        assert!(job.factory_hex().starts_with("0x"));
    }
}
