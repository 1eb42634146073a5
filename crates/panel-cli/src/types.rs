use std::path::PathBuf;

use panel_core::{Classification, StubTable};
use panel_model::RunReport;

/// Outcome of `panel-reshape run`.
#[derive(Debug)]
pub struct RunResult {
    pub report: RunReport,
    /// Where the run report was written; `None` for dry runs.
    pub report_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl RunResult {
    /// Validation failures are reported but never fail the run.
    pub fn has_validation_failures(&self) -> bool {
        !self.report.validation.all_passed()
    }
}

/// Outcome of `panel-reshape classify`.
#[derive(Debug)]
pub struct ClassifyResult {
    pub input: PathBuf,
    pub classification: Classification,
    pub stubs: StubTable,
}
