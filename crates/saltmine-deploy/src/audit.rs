//! Re-verification of a stored combined record against current artifacts

use saltmine_crypto::parse_fixed_hex;

use crate::aggregate::CombinedResult;
use crate::artifact::ArtifactResolver;
use crate::coordinator::verify_solution;
use crate::error::{DeployError, Result};
use crate::init_code::derive_init_code_hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStatus {
    /// Stored address equals CREATE2 of the stored salt and today's init code
    Verified,
    /// Address recomputes differently, e.g. the contract was rebuilt
    AddressMismatch { computed: String },
    /// Artifact or record could not be read
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub label: String,
    pub status: AuditStatus,
}

impl AuditEntry {
    pub fn is_verified(&self) -> bool {
        self.status == AuditStatus::Verified
    }
}

/// Check every contract in `combined`, in record order
pub fn audit_combined(combined: &CombinedResult, resolver: &ArtifactResolver) -> Result<Vec<AuditEntry>> {
    resolver.check_root()?;
    let factory = parse_fixed_hex::<20>(combined.factory()).map_err(|e| {
        DeployError::InvalidConfig(format!("record factory {}: {}", combined.factory(), e))
    })?;

    let entries = combined
        .contracts()
        .iter()
        .map(|(label, solution)| {
            let status = match resolver
                .resolve(label)
                .and_then(|artifact| derive_init_code_hash(&artifact.init_code))
                .and_then(|hash| verify_solution(label, &factory, &hash, solution))
            {
                Ok(_) => AuditStatus::Verified,
                Err(DeployError::IntegrityMismatch { computed, .. }) => {
                    AuditStatus::AddressMismatch { computed }
                }
                Err(other) => AuditStatus::Unresolved(other.to_string()),
            };
            AuditEntry {
                label: label.to_string(),
                status,
            }
        })
        .collect();

    Ok(entries)
}
