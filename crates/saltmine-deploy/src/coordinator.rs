//! Per-contract search coordination

use saltmine_crypto::{create2_address, eip55_checksum, parse_fixed_hex};
use saltmine_pattern::{calculate_difficulty, format_difficulty, PatternMatcher};
use tracing::{info, warn};

use crate::artifact::ArtifactResolver;
use crate::cancel::{CancelToken, SearchControl};
use crate::config::RunSettings;
use crate::engine::SearchEngine;
use crate::error::{DeployError, Result};
use crate::init_code::{derive_init_code_hash, InitCodeHash};
use crate::job::{SearchJob, SearchSolution};

/// Drives one contract at a time through resolve → hash → search → verify
pub struct Coordinator<'a> {
    settings: &'a RunSettings,
    resolver: ArtifactResolver,
    engine: &'a dyn SearchEngine,
    cancel: CancelToken,
}

impl<'a> Coordinator<'a> {
    pub fn new(settings: &'a RunSettings, engine: &'a dyn SearchEngine, cancel: CancelToken) -> Self {
        Self {
            settings,
            resolver: ArtifactResolver::new(settings.artifacts_dir()),
            engine,
            cancel,
        }
    }

    pub fn resolver(&self) -> &ArtifactResolver {
        &self.resolver
    }

    /// Run-level checks and the engine's build step. Any failure aborts the run.
    pub fn prepare(&self) -> Result<()> {
        self.resolver.check_root()?;
        self.engine.prepare().map_err(|e| match e {
            DeployError::PreconditionFailure(_) => e,
            other => DeployError::PreconditionFailure(other.to_string()),
        })?;
        info!(
            "Engine {} ready, artifacts in {}",
            self.engine.name(),
            self.resolver.root().display()
        );
        Ok(())
    }

    pub fn build_job(&self, label: &str, init_code_hash: InitCodeHash) -> SearchJob {
        SearchJob::new(
            *self.settings.factory(),
            init_code_hash,
            self.settings.target().clone(),
            label,
            self.settings.threads(),
            self.settings.output_path_for(label),
        )
    }

    /// Produce a verified solution for one contract
    pub fn process(&self, label: &str) -> Result<SearchSolution> {
        if self.cancel.is_cancelled() {
            return Err(DeployError::Cancelled);
        }

        let artifact = self.resolver.resolve(label)?;
        if artifact.has_empty_init_code() {
            return Err(DeployError::MalformedBytecode(format!(
                "{} has no init code (interface or abstract contract?)",
                artifact.path.display()
            )));
        }

        let init_code_hash = derive_init_code_hash(&artifact.init_code)?;
        info!("{}: init code hash {}", label, init_code_hash);

        let job = self.build_job(label, init_code_hash);
        let difficulty = calculate_difficulty(job.target());
        info!(
            "{}: searching for {} with {} lanes (difficulty {})",
            label,
            job.target(),
            job.worker_concurrency(),
            format_difficulty(difficulty)
        );

        let control = SearchControl::new(self.cancel.clone(), self.settings.timeout());
        let solution = self.engine.search(&job, &control)?;

        let address = verify_solution(label, job.factory(), &init_code_hash, &solution)?;
        let matcher = PatternMatcher::single(job.target().clone());
        if matcher.matches(&eip55_checksum(&address)).is_none() {
            warn!(
                "{}: {} is a valid CREATE2 address but does not match {}",
                label,
                solution.address,
                job.target()
            );
        }

        info!("{}: verified {} (salt {})", label, solution.address, solution.salt);
        Ok(solution)
    }
}

/// Recompute CREATE2 from the reported salt and compare address bytes.
///
/// Hex case is ignored, so EIP-55 and lowercase renderings both pass.
pub fn verify_solution(
    label: &str,
    factory: &[u8; 20],
    init_code_hash: &InitCodeHash,
    solution: &SearchSolution,
) -> Result<[u8; 20]> {
    let mismatch = |computed: String| DeployError::IntegrityMismatch {
        label: label.to_string(),
        reported: solution.address.clone(),
        computed,
    };

    let salt = parse_fixed_hex::<32>(&solution.salt)
        .map_err(|e| mismatch(format!("nothing (salt {}: {})", solution.salt, e)))?;
    let computed = create2_address(factory, &salt, init_code_hash.as_bytes());

    let reported = parse_fixed_hex::<20>(&solution.address)
        .map_err(|e| mismatch(format!("{} (reported address unparsable: {})", eip55_checksum(&computed), e)))?;

    if reported != computed {
        return Err(mismatch(eip55_checksum(&computed)));
    }
    Ok(computed)
}
