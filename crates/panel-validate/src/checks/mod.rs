//! Individual diagnostic checks.
//!
//! Every check returns a [`CheckResult`](panel_model::CheckResult) and never
//! fails the run.

pub mod columns;
pub mod in_wave;
pub mod range;
pub mod shape;
pub mod year;

use panel_ingest::any_to_f64;
use polars::prelude::{AnyValue, Column};

/// Offending values kept per check.
pub const MAX_SAMPLES: usize = 5;

/// Push a sample unless the cap is reached.
pub(crate) fn push_sample(samples: &mut Vec<String>, sample: String) {
    if samples.len() < MAX_SAMPLES {
        samples.push(sample);
    }
}

/// Value of a cell as a number; `None` for nulls and unreadable cells.
pub(crate) fn numeric_at(column: &Column, row: usize) -> Option<f64> {
    column.get(row).ok().and_then(any_to_f64)
}

/// True when a cell is null (or unreadable).
pub(crate) fn is_null_at(column: &Column, row: usize) -> bool {
    column
        .get(row)
        .map_or(true, |value| matches!(value, AnyValue::Null))
}
