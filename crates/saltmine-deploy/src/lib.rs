//! Saltmine deployment planner
//!
//! Resolves build artifacts, derives CREATE2 init code hashes, drives one
//! salt search per contract and aggregates the verified results into a single
//! record.

mod aggregate;
mod artifact;
mod audit;
mod cancel;
mod config;
mod coordinator;
mod engine;
mod error;
mod init_code;
mod job;
mod pipeline;
mod report;
#[cfg(test)]
mod testing;

pub use aggregate::{CombinedResult, ContractSolutions, ResultAggregator};
pub use artifact::{ArtifactResolver, BuildArtifact};
pub use audit::{audit_combined, AuditEntry, AuditStatus};
pub use cancel::{CancelToken, SearchControl};
pub use config::{RunConfig, RunSettings, DEFAULT_FACTORY};
pub use coordinator::{verify_solution, Coordinator};
pub use engine::{BuildStep, InProcessEngine, ProcessEngine, SearchEngine};
pub use error::{DeployError, Disposition, Result};
pub use init_code::{derive_init_code_hash, InitCodeHash};
pub use job::{SearchJob, SearchSolution, WorkerReport};
pub use pipeline::{run_batch, BatchOutcome};
pub use report::RunReport;
