//! Diagnostic check battery for reshaped long tables.
//!
//! Checks never abort: each one is recorded PASS/FAIL in a
//! [`ValidationReport`] and failures are logged at `warn`.

pub mod checks;

use panel_model::{ReshapeConfig, ValidationReport};
use polars::prelude::DataFrame;
use tracing::{info, warn};

pub use checks::MAX_SAMPLES;

/// Facts about the reshape the checks compare the long table against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Subject key column as named in the long table.
    pub subject_column: &'a str,
    /// Number of subjects in the wide input.
    pub subject_count: usize,
}

/// Run every check against the long table.
pub fn validate_long(
    long: &DataFrame,
    config: &ReshapeConfig,
    context: ValidationContext<'_>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    report.push(checks::shape::check_row_count(
        long,
        context.subject_count,
        config.max_wave,
    ));
    report.push(checks::shape::check_rows_per_subject(
        long,
        context.subject_column,
        config.max_wave,
    ));
    report.push(checks::shape::check_wave_values(
        long,
        &config.wave_column,
        config.max_wave,
    ));
    for check in checks::columns::check_required_columns(long, &config.required_columns) {
        report.push(check);
    }
    if let Some(in_wave) = config.in_wave_column() {
        report.push(checks::in_wave::check_in_wave_boolean(long, &in_wave));
        report.push(checks::in_wave::check_in_wave_coverage(
            long,
            &in_wave,
            &config.wave_column,
            config.max_wave,
        ));
    }
    for range in &config.range_checks {
        report.push(checks::range::check_range(long, range));
    }
    report.push(checks::year::check_year_mapping(long, config));

    for failure in report.failures() {
        warn!(
            check = %failure.name,
            expected = %failure.expected,
            observed = %failure.observed,
            samples = ?failure.samples,
            "validation check failed"
        );
    }
    info!(
        checks = report.checks.len(),
        passed = report.pass_count(),
        failed = report.failure_count(),
        "validation complete"
    );
    report
}
