//! Build artifact resolution
//!
//! Artifacts are found by file name (`{label}.json`) anywhere under a root
//! directory. Hardhat (`"bytecode": "0x.."`) and Foundry
//! (`"bytecode": {"object": "0x.."}`) layouts are both understood.

use std::path::{Path, PathBuf};

use saltmine_crypto::strip_hex_prefix;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{DeployError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    bytecode: BytecodeField,
}

/// A compiled contract as read from the build output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Contract name recorded in the artifact, or the label it was resolved by
    pub name: String,
    /// Initialization bytecode, hex with an optional `0x` prefix
    pub init_code: String,
    /// File the artifact was read from
    pub path: PathBuf,
}

impl BuildArtifact {
    /// Parse an artifact file
    pub fn from_file(path: &Path, label: &str) -> Result<Self> {
        let invalid = |reason: String| DeployError::InvalidArtifact {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let raw: RawArtifact = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        let init_code = match raw.bytecode {
            BytecodeField::Hex(hex) => hex,
            BytecodeField::Object { object } => object,
        };

        Ok(Self {
            name: raw.contract_name.unwrap_or_else(|| label.to_string()),
            init_code,
            path: path.to_path_buf(),
        })
    }

    /// True for interfaces and abstract contracts, which have no init code
    pub fn has_empty_init_code(&self) -> bool {
        strip_hex_prefix(self.init_code.trim()).is_empty()
    }

    fn normalized_init_code(&self) -> String {
        strip_hex_prefix(self.init_code.trim()).to_ascii_lowercase()
    }
}

/// Locates `{label}.json` artifacts under a root directory
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    root: PathBuf,
}

impl ArtifactResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The artifact directory must exist before any contract is processed
    pub fn check_root(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(DeployError::PreconditionFailure(format!(
                "artifact directory {} not found; run from a directory whose sibling holds the build artifacts",
                self.root.display()
            )))
        }
    }

    /// Every file named `{label}.json` under the root, in sorted traversal order
    pub fn locate(&self, label: &str) -> Result<Vec<PathBuf>> {
        if label.is_empty() {
            return Err(DeployError::InvalidConfig("contract label is empty".into()));
        }
        self.check_root()?;

        let file_name = format!("{}.json", label);
        let mut found = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_file() && entry.file_name() == file_name.as_str() {
                found.push(entry.into_path());
            }
        }

        Ok(found)
    }

    /// Resolve and load the artifact for a contract label.
    ///
    /// Duplicates holding identical init code resolve to the first path in
    /// traversal order; duplicates that differ are an error.
    pub fn resolve(&self, label: &str) -> Result<BuildArtifact> {
        let paths = self.locate(label)?;

        let Some(first_path) = paths.first() else {
            return Err(DeployError::ArtifactNotFound {
                label: label.to_string(),
                root: self.root.clone(),
            });
        };

        let first = BuildArtifact::from_file(first_path, label)?;
        if paths.len() == 1 {
            return Ok(first);
        }

        let expected = first.normalized_init_code();
        for path in &paths[1..] {
            let other = BuildArtifact::from_file(path, label)?;
            if other.normalized_init_code() != expected {
                warn!(
                    "{} has {} artifacts with differing bytecode",
                    label,
                    paths.len()
                );
                return Err(DeployError::AmbiguousArtifact {
                    label: label.to_string(),
                    paths,
                });
            }
        }

        debug!(
            "{} found {} times with identical bytecode, using {}",
            label,
            paths.len(),
            first_path.display()
        );
        Ok(first)
    }
}
