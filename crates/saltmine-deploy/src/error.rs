use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = DeployError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Precondition failed: {0}")]
    PreconditionFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Artifact {label}.json not found under {}", .root.display())]
    ArtifactNotFound { label: String, root: PathBuf },

    #[error("Artifact {label}.json is ambiguous: {} copies with different bytecode", .paths.len())]
    AmbiguousArtifact { label: String, paths: Vec<PathBuf> },

    #[error("Invalid artifact {}: {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("Malformed bytecode: {0}")]
    MalformedBytecode(String),

    #[error("Worker failed for {label}: {reason}")]
    WorkerExecutionFailure { label: String, reason: String },

    #[error("Search for {label} timed out after {after:?}")]
    SearchTimedOut { label: String, after: Duration },

    #[error("Integrity mismatch for {label}: worker reported {reported}, CREATE2 gives {computed}")]
    IntegrityMismatch {
        label: String,
        reported: String,
        computed: String,
    },

    #[error("Duplicate result for {0}")]
    DuplicateResult(String),

    #[error("Invalid result record {}: {reason}", .path.display())]
    InvalidRecord { path: PathBuf, reason: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Failed to persist {}: {source}", .path.display())]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How the batch reacts to an error raised while processing one contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Log, exclude the contract, continue with the next one
    Skip,
    /// Like `Skip`, but reported separately and at error level
    Integrity,
    /// Abort the run
    Fatal,
}

impl DeployError {
    pub fn disposition(&self) -> Disposition {
        match self {
            DeployError::ArtifactNotFound { .. }
            | DeployError::AmbiguousArtifact { .. }
            | DeployError::InvalidArtifact { .. }
            | DeployError::MalformedBytecode(_)
            | DeployError::WorkerExecutionFailure { .. }
            | DeployError::SearchTimedOut { .. } => Disposition::Skip,
            DeployError::IntegrityMismatch { .. } => Disposition::Integrity,
            DeployError::PreconditionFailure(_)
            | DeployError::InvalidConfig(_)
            | DeployError::DuplicateResult(_)
            | DeployError::InvalidRecord { .. }
            | DeployError::Cancelled
            | DeployError::PersistenceFailure { .. } => Disposition::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_contract_errors_are_recoverable() {
        let err = DeployError::MalformedBytecode("odd length".into());
        assert_eq!(err.disposition(), Disposition::Skip);

        let err = DeployError::WorkerExecutionFailure {
            label: "Foo".into(),
            reason: "exit status: 1".into(),
        };
        assert_eq!(err.disposition(), Disposition::Skip);
    }

    #[test]
    fn test_integrity_is_distinct() {
        let err = DeployError::IntegrityMismatch {
            label: "Foo".into(),
            reported: "0x01".into(),
            computed: "0x02".into(),
        };
        assert_eq!(err.disposition(), Disposition::Integrity);
        assert!(err.to_string().contains("Foo"));
    }

    #[test]
    fn test_run_level_errors_are_fatal() {
        assert_eq!(DeployError::Cancelled.disposition(), Disposition::Fatal);
        assert_eq!(
            DeployError::PreconditionFailure("no artifacts".into()).disposition(),
            Disposition::Fatal
        );
    }
}
