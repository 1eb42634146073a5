//! Grid shape checks: row count, rows per subject, wave domain.

use std::collections::{BTreeSet, HashMap};

use panel_ingest::any_to_string;
use panel_model::CheckResult;
use polars::prelude::DataFrame;

use super::{numeric_at, push_sample};

/// Rows must equal `subject_count * max_wave`.
pub fn check_row_count(long: &DataFrame, subject_count: usize, max_wave: u32) -> CheckResult {
    let expected = subject_count * max_wave as usize;
    CheckResult::new(
        "row_count",
        long.height() == expected,
        format!("{subject_count} subjects x {max_wave} waves = {expected}"),
        long.height().to_string(),
    )
}

/// Every subject must have exactly `max_wave` rows.
pub fn check_rows_per_subject(
    long: &DataFrame,
    subject_column: &str,
    max_wave: u32,
) -> CheckResult {
    let name = "rows_per_subject";
    let expected = format!("{max_wave} rows for every subject");
    let Ok(column) = long.column(subject_column) else {
        return CheckResult::new(
            name,
            false,
            expected,
            format!("subject column '{subject_column}' is absent"),
        );
    };

    let mut order = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in 0..long.height() {
        let key = column.get(row).map(any_to_string).unwrap_or_default();
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let mut samples = Vec::new();
    let mut offenders = 0usize;
    for key in &order {
        let count = counts.get(key).copied().unwrap_or(0);
        if count != max_wave as usize {
            offenders += 1;
            push_sample(&mut samples, format!("{key}: {count} rows"));
        }
    }

    CheckResult::new(
        name,
        offenders == 0,
        expected,
        format!("{offenders} of {} subjects deviate", order.len()),
    )
    .with_samples(samples)
}

/// Distinct waves must be exactly `1..=max_wave`.
pub fn check_wave_values(long: &DataFrame, wave_column: &str, max_wave: u32) -> CheckResult {
    let name = "wave_values";
    let expected = format!("1..={max_wave}");
    let Ok(column) = long.column(wave_column) else {
        return CheckResult::new(
            name,
            false,
            expected,
            format!("wave column '{wave_column}' is absent"),
        );
    };

    let mut observed: BTreeSet<i64> = BTreeSet::new();
    let mut unreadable = 0usize;
    for row in 0..long.height() {
        match numeric_at(column, row) {
            Some(wave) if wave.fract() == 0.0 => {
                observed.insert(wave as i64);
            }
            _ => unreadable += 1,
        }
    }

    let wanted: BTreeSet<i64> = (1..=i64::from(max_wave)).collect();
    let passed = unreadable == 0 && observed == wanted;
    let mut description = match (observed.first(), observed.last()) {
        (Some(first), Some(last)) => {
            format!("{} distinct waves in {first}..={last}", observed.len())
        }
        _ => "no waves".to_string(),
    };
    if unreadable > 0 {
        description.push_str(&format!(", {unreadable} null or non-integer"));
    }

    let samples = wanted
        .symmetric_difference(&observed)
        .take(super::MAX_SAMPLES)
        .map(|wave| {
            if observed.contains(wave) {
                format!("unexpected wave {wave}")
            } else {
                format!("missing wave {wave}")
            }
        })
        .collect();
    CheckResult::new(name, passed, expected, description).with_samples(samples)
}
