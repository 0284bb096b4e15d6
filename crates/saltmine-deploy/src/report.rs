//! End-of-run summary

use std::fmt;

use tracing::{error, info, warn};

use crate::error::{DeployError, Disposition};

/// What happened to every requested contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    requested: Vec<String>,
    succeeded: Vec<String>,
    skipped: Vec<(String, String)>,
    integrity_failed: Vec<(String, String)>,
}

impl RunReport {
    pub fn new(requested: &[String]) -> Self {
        Self {
            requested: requested.to_vec(),
            ..Default::default()
        }
    }

    pub fn record_success(&mut self, label: &str) {
        self.succeeded.push(label.to_string());
    }

    /// File a per-contract failure under skipped or integrity-failed
    pub fn record_failure(&mut self, label: &str, err: &DeployError) {
        let entry = (label.to_string(), err.to_string());
        match err.disposition() {
            Disposition::Integrity => self.integrity_failed.push(entry),
            Disposition::Skip | Disposition::Fatal => self.skipped.push(entry),
        }
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    pub fn succeeded(&self) -> &[String] {
        &self.succeeded
    }

    pub fn skipped(&self) -> &[(String, String)] {
        &self.skipped
    }

    pub fn integrity_failed(&self) -> &[(String, String)] {
        &self.integrity_failed
    }

    /// Requested labels with no result, in request order
    pub fn missing(&self) -> Vec<&str> {
        self.requested
            .iter()
            .filter(|l| !self.succeeded.contains(l))
            .map(String::as_str)
            .collect()
    }

    pub fn is_total_failure(&self) -> bool {
        self.succeeded.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            "{}/{} contract(s) succeeded",
            self.succeeded.len(),
            self.requested.len()
        );
        for (label, reason) in &self.skipped {
            warn!("Skipped {}: {}", label, reason);
        }
        for (label, detail) in &self.integrity_failed {
            error!("Integrity failure {}: {}", label, detail);
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Succeeded: {}/{}",
            self.succeeded.len(),
            self.requested.len()
        )?;
        for label in &self.succeeded {
            writeln!(f, "  ✓ {}", label)?;
        }
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped:")?;
            for (label, reason) in &self.skipped {
                writeln!(f, "  - {}: {}", label, reason)?;
            }
        }
        if !self.integrity_failed.is_empty() {
            writeln!(f, "Integrity failures:")?;
            for (label, detail) in &self.integrity_failed {
                writeln!(f, "  ✗ {}: {}", label, detail)?;
            }
        }
        let missing = self.missing();
        if !missing.is_empty() {
            writeln!(f, "Missing: {}", missing.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_categories() {
        let requested = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let mut report = RunReport::new(&requested);

        report.record_success("B");
        report.record_failure("A", &DeployError::MalformedBytecode("odd length".into()));
        report.record_failure(
            "C",
            &DeployError::IntegrityMismatch {
                label: "C".into(),
                reported: "0x01".into(),
                computed: "0x02".into(),
            },
        );

        assert_eq!(report.missing(), ["A", "C"]);
        assert_eq!(report.skipped().len(), 1);
        assert_eq!(report.integrity_failed().len(), 1);
        assert!(!report.is_total_failure());

        let text = report.to_string();
        assert!(text.contains("Succeeded: 1/3"));
        assert!(text.contains("Missing: A, C"));
        assert!(text.contains("Integrity failures:"));
    }

    #[test]
    fn test_total_failure() {
        let report = RunReport::new(&["A".to_string()]);
        assert!(report.is_total_failure());
        assert_eq!(report.missing(), ["A"]);
    }
}
