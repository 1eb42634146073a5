use polars::prelude::*;

use crate::error::Result;

/// Long table for one entity prefix.
///
/// `data` holds the subject key, the wave column and one column per stub,
/// with one row per `(subject, wave)` for the waves the prefix touches.
#[derive(Debug, Clone)]
pub struct PrefixFrame {
    pub prefix: String,
    pub data: DataFrame,
    /// Waves present in `data`, ascending.
    pub waves: Vec<u32>,
    /// Output stub column names, in output order.
    pub stub_columns: Vec<String>,
}

impl PrefixFrame {
    pub fn new(
        prefix: impl Into<String>,
        data: DataFrame,
        waves: Vec<u32>,
        stub_columns: Vec<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            data,
            waves,
            stub_columns,
        }
    }

    pub fn record_count(&self) -> usize {
        self.data.height()
    }

    pub fn stub_count(&self) -> usize {
        self.stub_columns.len()
    }
}

/// Copy `column` into a new column, one output row per entry of `rows`.
///
/// `None` entries become nulls. The source dtype is kept.
pub fn gather_column(column: &Column, rows: &[Option<usize>], name: &str) -> Result<Column> {
    let indices = rows
        .iter()
        .copied()
        .map(|row| row.map(IdxSize::try_from).transpose())
        .collect::<std::result::Result<Vec<Option<IdxSize>>, _>>()
        .map_err(|_| {
            PolarsError::OutOfBounds(format!("row index exceeds {}", IdxSize::MAX).into())
        })?;
    let indices = IdxCa::from_iter_options(name.into(), indices.into_iter());
    Ok(column.take(&indices)?.with_name(name.into()))
}

/// Wave indicator column as `i32`.
pub fn wave_series(name: &str, waves: impl IntoIterator<Item = u32>) -> Series {
    let waves: Vec<i32> = waves
        .into_iter()
        .map(|wave| i32::try_from(wave).unwrap_or(i32::MAX))
        .collect();
    Series::new(name.into(), waves)
}
