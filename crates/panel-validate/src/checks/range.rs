use panel_ingest::any_to_string;
use panel_model::{CheckResult, RangeCheck};
use polars::prelude::DataFrame;

use super::{is_null_at, numeric_at, push_sample};

/// Known-scale column values must fall within `[min, max]`.
///
/// Nulls are skipped; non-numeric values count as violations.
pub fn check_range(long: &DataFrame, range: &RangeCheck) -> CheckResult {
    let name = format!("range:{}", range.column);
    let expected = format!("values in [{}, {}]", range.min, range.max);
    let Ok(column) = long.column(&range.column) else {
        return CheckResult::new(name, false, expected, "column absent");
    };

    let mut checked = 0usize;
    let mut violations = 0usize;
    let mut samples = Vec::new();
    for row in 0..long.height() {
        if is_null_at(column, row) {
            continue;
        }
        checked += 1;
        let in_range = numeric_at(column, row)
            .is_some_and(|value| value >= range.min && value <= range.max);
        if !in_range {
            violations += 1;
            let raw = column.get(row).map(any_to_string).unwrap_or_default();
            push_sample(&mut samples, format!("row {}: {raw}", row + 1));
        }
    }

    CheckResult::new(
        name,
        violations == 0,
        expected,
        format!("{violations} of {checked} values out of range"),
    )
    .with_samples(samples)
}
