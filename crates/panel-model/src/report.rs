//! Run reports produced after a reshape.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    pub fn from_bool(passed: bool) -> Self {
        if passed { Self::Pass } else { Self::Fail }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

/// Outcome of one diagnostic check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Stable check identifier (e.g. `row_count`, `range:R.shlt`).
    pub name: String,
    pub status: CheckStatus,
    pub expected: String,
    pub observed: String,
    /// Offending values, capped to a handful.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<String>,
}

impl CheckResult {
    pub fn new(
        name: impl Into<String>,
        passed: bool,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::from_bool(passed),
            expected: expected.into(),
            observed: observed.into(),
            samples: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_samples(mut self, samples: Vec<String>) -> Self {
        self.samples = samples;
        self
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Aggregated diagnostic results for the final long table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn push(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|check| !check.passed())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn pass_count(&self) -> usize {
        self.checks.len() - self.failure_count()
    }

    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|check| check.name == name)
    }
}

/// Per-prefix summary of the reshape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixSummary {
    pub prefix: String,
    pub stub_count: usize,
    pub waves: Vec<u32>,
    pub long_rows: usize,
}

/// Everything an operator needs to judge whether the output is fit for use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub input: Option<PathBuf>,
    pub input_sha256: Option<String>,
    pub output: Option<PathBuf>,
    pub output_sha256: Option<String>,
    pub subject_count: usize,
    pub max_wave: u32,
    pub row_count: usize,
    pub column_count: usize,
    pub time_invariant_columns: usize,
    pub prefixes: Vec<PrefixSummary>,
    /// Naming inconsistencies and suspicious parses found during classification.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub validation: ValidationReport,
}

impl RunReport {
    pub fn new(subject_count: usize, max_wave: u32) -> Self {
        Self {
            generated_at: Utc::now(),
            input: None,
            input_sha256: None,
            output: None,
            output_sha256: None,
            subject_count,
            max_wave,
            row_count: 0,
            column_count: 0,
            time_invariant_columns: 0,
            prefixes: Vec::new(),
            warnings: Vec::new(),
            validation: ValidationReport::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts() {
        let mut report = ValidationReport::default();
        report.push(CheckResult::new("row_count", true, "9", "9"));
        report.push(CheckResult::new("wave_values", false, "1..=3", "1,2"));
        assert_eq!(report.pass_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert!(!report.all_passed());
        assert_eq!(
            report.get("wave_values").map(|check| check.status),
            Some(CheckStatus::Fail)
        );
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&CheckStatus::Pass).expect("serialize status");
        assert_eq!(json, "\"PASS\"");
    }
}
