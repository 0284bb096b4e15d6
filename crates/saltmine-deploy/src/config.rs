//! Run configuration
//!
//! [`RunConfig`] is the user-facing form (JSON file or defaults, then CLI
//! overrides). [`RunSettings`] is the validated, immutable form the pipeline
//! reads from.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use saltmine_crypto::{eip55_checksum, parse_fixed_hex};
use saltmine_pattern::{Pattern, PatternType};
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};

/// Factory used when none is configured
pub const DEFAULT_FACTORY: &str = "0xAA28020DDA6b954D16208eccF873D79AC6533833";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Label written into the combined record
    pub network: String,
    /// CREATE2 factory address
    pub factory: String,
    /// Hex digits the address must contain
    pub pattern: String,
    pub pattern_type: PatternType,
    /// Digits the address must also end with (`0x69...d777` style targets)
    pub suffix: Option<String>,
    pub case_insensitive: bool,
    /// Worker lanes per search (0 = auto)
    pub threads: usize,
    /// Contract labels, processed in this order
    pub contracts: Vec<String>,
    pub artifacts_dir: PathBuf,
    /// Directory for per-contract worker output
    pub work_dir: PathBuf,
    /// Combined record, relative to `work_dir` unless absolute
    pub output: PathBuf,
    /// Per-contract search budget (0 = unlimited)
    pub timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            network: "multi-chain".to_string(),
            factory: DEFAULT_FACTORY.to_string(),
            pattern: "777".to_string(),
            pattern_type: PatternType::Suffix,
            suffix: None,
            case_insensitive: true,
            threads: 8,
            contracts: vec!["OmniDragonHybridRegistry".to_string(), "omniDRAGON".to_string()],
            artifacts_dir: PathBuf::from("../artifacts"),
            work_dir: PathBuf::from("."),
            output: PathBuf::from("vanity_addresses_combined.json"),
            timeout_secs: 0,
        }
    }
}

impl RunConfig {
    /// Load from a JSON file. Missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DeployError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// Validate and freeze into [`RunSettings`]
    pub fn settings(&self) -> Result<RunSettings> {
        let factory = parse_fixed_hex::<20>(&self.factory)
            .map_err(|e| DeployError::InvalidConfig(format!("factory {}: {}", self.factory, e)))?;

        let mut target = Pattern {
            value: self.pattern.clone(),
            pattern_type: self.pattern_type,
            case_insensitive: self.case_insensitive,
            required_suffix: self
                .suffix
                .as_deref()
                .map(|s| s.strip_prefix("0x").unwrap_or(s).to_string()),
        };
        target
            .validate()
            .map_err(|e| DeployError::InvalidConfig(format!("pattern: {}", e)))?;
        target.value = target.digits().to_string();

        if self.contracts.is_empty() {
            return Err(DeployError::InvalidConfig("no contracts to process".into()));
        }

        let mut labels = HashSet::new();
        let mut outputs = HashSet::new();
        for label in &self.contracts {
            validate_label(label)?;
            if !labels.insert(label.as_str()) {
                return Err(DeployError::InvalidConfig(format!(
                    "contract {} listed twice",
                    label
                )));
            }
            if !outputs.insert(label.to_lowercase()) {
                return Err(DeployError::InvalidConfig(format!(
                    "contract {} collides with another label's output file",
                    label
                )));
            }
        }

        let threads = if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        };

        Ok(RunSettings {
            network: self.network.clone(),
            factory,
            target,
            threads,
            contracts: self.contracts.clone(),
            artifacts_dir: self.artifacts_dir.clone(),
            output_path: self.work_dir.join(&self.output),
            work_dir: self.work_dir.clone(),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        })
    }
}

fn validate_label(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(DeployError::InvalidConfig("contract label is empty".into()));
    }
    if label.contains(['/', '\\']) || label == "." || label == ".." {
        return Err(DeployError::InvalidConfig(format!(
            "contract label {} is not a plain name",
            label
        )));
    }
    Ok(())
}

/// Validated run settings, fixed for the whole run
#[derive(Debug, Clone)]
pub struct RunSettings {
    network: String,
    factory: [u8; 20],
    target: Pattern,
    threads: usize,
    contracts: Vec<String>,
    artifacts_dir: PathBuf,
    work_dir: PathBuf,
    output_path: PathBuf,
    timeout: Option<Duration>,
}

impl RunSettings {
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn factory(&self) -> &[u8; 20] {
        &self.factory
    }

    pub fn factory_hex(&self) -> String {
        eip55_checksum(&self.factory)
    }

    pub fn target(&self) -> &Pattern {
        &self.target
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn contracts(&self) -> &[String] {
        &self.contracts
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Where the combined record is written
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Per-contract worker output file
    pub fn output_path_for(&self, label: &str) -> PathBuf {
        self.work_dir
            .join(format!("vanity_{}.json", label.to_lowercase()))
    }
}
