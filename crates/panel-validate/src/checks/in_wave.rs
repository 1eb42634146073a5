//! In-wave indicator checks.

use std::collections::BTreeMap;

use panel_ingest::any_to_string;
use panel_model::CheckResult;
use polars::prelude::{DataFrame, DataType};

use super::{is_null_at, numeric_at, push_sample};

/// Indicator values must be boolean: a boolean column, or 0/1 otherwise.
pub fn check_in_wave_boolean(long: &DataFrame, in_wave_column: &str) -> CheckResult {
    let name = "in_wave_boolean";
    let expected = "boolean or 0/1 values";
    let Ok(column) = long.column(in_wave_column) else {
        return CheckResult::new(
            name,
            false,
            expected,
            format!("column '{in_wave_column}' is absent"),
        );
    };
    if column.dtype() == &DataType::Boolean {
        return CheckResult::new(name, true, expected, "boolean column");
    }

    let mut samples = Vec::new();
    let mut offending = 0usize;
    for row in 0..long.height() {
        if is_null_at(column, row) {
            continue;
        }
        let is_flag = numeric_at(column, row).is_some_and(|value| value == 0.0 || value == 1.0);
        if !is_flag {
            offending += 1;
            let raw = column.get(row).map(any_to_string).unwrap_or_default();
            push_sample(&mut samples, format!("row {}: {raw}", row + 1));
        }
    }
    CheckResult::new(
        name,
        offending == 0,
        expected,
        format!("{offending} non-boolean values ({})", column.dtype()),
    )
    .with_samples(samples)
}

/// Every wave must have at least one interviewed subject.
pub fn check_in_wave_coverage(
    long: &DataFrame,
    in_wave_column: &str,
    wave_column: &str,
    max_wave: u32,
) -> CheckResult {
    let name = "in_wave_coverage";
    let expected = "at least one interviewed subject per wave";
    let (Ok(flags), Ok(waves)) = (long.column(in_wave_column), long.column(wave_column)) else {
        return CheckResult::new(
            name,
            false,
            expected,
            format!("column '{in_wave_column}' or '{wave_column}' is absent"),
        );
    };

    let mut interviewed: BTreeMap<u32, usize> = (1..=max_wave).map(|wave| (wave, 0)).collect();
    for row in 0..long.height() {
        let Some(wave) = numeric_at(waves, row) else {
            continue;
        };
        if numeric_at(flags, row) == Some(1.0)
            && let Some(count) = interviewed.get_mut(&(wave as u32))
        {
            *count += 1;
        }
    }

    let sparse: Vec<u32> = interviewed
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(wave, _)| *wave)
        .collect();
    let observed = if sparse.is_empty() {
        "every wave interviewed".to_string()
    } else {
        format!("{} waves without interviews", sparse.len())
    };
    let samples = sparse
        .iter()
        .take(super::MAX_SAMPLES)
        .map(|wave| format!("wave {wave}"))
        .collect();
    CheckResult::new(name, sparse.is_empty(), expected, observed).with_samples(samples)
}
