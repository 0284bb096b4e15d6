//! Combined result record

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use crate::config::RunSettings;
use crate::error::{DeployError, Result};
use crate::job::SearchSolution;

/// Label → solution, in processing order, labels unique
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractSolutions(Vec<(String, SearchSolution)>);

impl ContractSolutions {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&SearchSolution> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, s)| s)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SearchSolution)> {
        self.0.iter().map(|(l, s)| (l.as_str(), s))
    }

    fn insert(&mut self, label: String, solution: SearchSolution) -> Result<()> {
        if self.contains(&label) {
            return Err(DeployError::DuplicateResult(label));
        }
        self.0.push((label, solution));
        Ok(())
    }
}

impl Serialize for ContractSolutions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, solution) in &self.0 {
            map.serialize_entry(label, solution)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ContractSolutions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SolutionsVisitor;

        impl<'de> Visitor<'de> for SolutionsVisitor {
            type Value = ContractSolutions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of contract labels to solutions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut solutions = ContractSolutions::default();
                while let Some((label, solution)) = access.next_entry::<String, SearchSolution>()? {
                    if solutions.contains(&label) {
                        return Err(serde::de::Error::custom(format!("duplicate contract {}", label)));
                    }
                    solutions.0.push((label, solution));
                }
                Ok(solutions)
            }
        }

        deserializer.deserialize_map(SolutionsVisitor)
    }
}

/// One run's verified results, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    network: String,
    timestamp: String,
    factory: String,
    contracts: ContractSolutions,
}

impl CombinedResult {
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn factory(&self) -> &str {
        &self.factory
    }

    pub fn contracts(&self) -> &ContractSolutions {
        &self.contracts
    }

    /// Write atomically. On failure `self` is untouched and may be persisted again.
    pub fn persist(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)?;
        info!(
            "Saved {} contract(s) to {}",
            self.contracts.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let invalid = |reason: String| DeployError::InvalidRecord {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }
}

/// Operator table: everything needed to deploy each contract
impl fmt::Display for CombinedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Factory: {}", self.factory)?;
        for (label, solution) in self.contracts.iter() {
            writeln!(f, "{:-<60}", "")?;
            writeln!(f, "{}", label)?;
            writeln!(f, "  Address:  {}", solution.address)?;
            writeln!(f, "  Salt:     {}", solution.salt)?;
            writeln!(f, "  Attempts: {}", solution.attempts)?;
            writeln!(f, "  Time:     {:.2}s", solution.duration_seconds)?;
        }
        writeln!(f, "{:-<60}", "")
    }
}

/// Collects verified solutions during a run
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    network: String,
    factory: String,
    contracts: ContractSolutions,
}

impl ResultAggregator {
    pub fn new(network: impl Into<String>, factory: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            factory: factory.into(),
            contracts: ContractSolutions::default(),
        }
    }

    pub fn for_run(settings: &RunSettings) -> Self {
        Self::new(settings.network(), settings.factory_hex())
    }

    pub fn push(&mut self, label: impl Into<String>, solution: SearchSolution) -> Result<()> {
        self.contracts.insert(label.into(), solution)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// The combined record, or `None` when nothing succeeded.
    /// The record's timestamp is the first solution's.
    pub fn finish(self) -> Option<CombinedResult> {
        let timestamp = self.contracts.0.first()?.1.timestamp.clone();
        Some(CombinedResult {
            network: self.network,
            timestamp,
            factory: self.factory,
            contracts: self.contracts,
        })
    }
}

/// Pretty JSON to `<path>.tmp`, then rename over `path`
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| DeployError::PersistenceFailure {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;

    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    if let Err(source) = std::fs::write(&temp_path, json) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(DeployError::PersistenceFailure {
            path: path.to_path_buf(),
            source,
        });
    }

    if let Err(source) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(DeployError::PersistenceFailure {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}
