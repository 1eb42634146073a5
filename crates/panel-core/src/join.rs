//! Joining per-prefix long tables onto the canonical subject × wave grid.

use std::collections::{BTreeSet, HashMap};

use panel_ingest::any_to_string;
use panel_model::ReshapeConfig;
use polars::prelude::*;
use tracing::debug;

use crate::error::{ReshapeError, Result};
use crate::frame::{PrefixFrame, gather_column, wave_series};
use crate::subjects::SubjectIndex;

/// Build the unified long table.
///
/// `invariants` is the time-invariant projection of the wide table (one row
/// per subject, subject key included) and defines the grid together with
/// `config.max_wave`. Prefix tables are left-joined on `(subject, wave)`.
pub fn join_long(
    invariants: &DataFrame,
    subjects: &SubjectIndex,
    prefix_frames: &[PrefixFrame],
    config: &ReshapeConfig,
) -> Result<DataFrame> {
    let waves: Vec<u32> = config.waves().collect();
    let grid_rows = subjects.len() * waves.len();

    let mut names = OutputNames::default();
    let mut columns: Vec<Column> = Vec::new();

    let subject_rows: Vec<Option<usize>> = (0..subjects.len())
        .flat_map(|subject| std::iter::repeat_n(Some(subject), waves.len()))
        .collect();

    names.claim(subjects.column())?;
    columns.push(gather_column(
        invariants.column(subjects.column())?,
        &subject_rows,
        subjects.column(),
    )?);
    names.claim(&config.wave_column)?;
    columns.push(
        wave_series(
            &config.wave_column,
            (0..subjects.len()).flat_map(|_| waves.iter().copied()),
        )
        .into(),
    );

    for column in invariants.get_columns() {
        let name = column.name().as_str();
        if name == subjects.column() {
            continue;
        }
        names.claim(name)?;
        columns.push(gather_column(column, &subject_rows, name)?);
    }

    for frame in prefix_frames {
        let index = index_prefix_frame(frame, subjects, config)?;
        let rows: Vec<Option<usize>> = subjects
            .keys()
            .iter()
            .flat_map(|key| {
                waves
                    .iter()
                    .map(|wave| index.get(&(key.clone(), *wave)).copied())
                    .collect::<Vec<_>>()
            })
            .collect();
        for stub_column in &frame.stub_columns {
            names.claim(stub_column)?;
            columns.push(gather_column(
                frame.data.column(stub_column)?,
                &rows,
                stub_column,
            )?);
        }
        debug!(
            prefix = %frame.prefix,
            matched = rows.iter().filter(|row| row.is_some()).count(),
            grid_rows,
            "prefix joined"
        );
    }

    let long = DataFrame::new(columns)?;
    if long.height() != grid_rows {
        return Err(ReshapeError::shape(format!(
            "long table has {} rows, expected {grid_rows}",
            long.height()
        )));
    }
    Ok(long)
}

/// Confirm every time-invariant column is constant within each subject.
pub fn verify_time_invariants(
    long: &DataFrame,
    subjects: &SubjectIndex,
    invariant_columns: &[&str],
    max_wave: u32,
) -> Result<()> {
    let per_subject = max_wave as usize;
    for name in invariant_columns {
        let column = long.column(name)?;
        for (subject, key) in subjects.keys().iter().enumerate() {
            let first_row = subject * per_subject;
            let first = column.get(first_row)?;
            for row in first_row + 1..first_row + per_subject {
                if column.get(row)? != first {
                    return Err(ReshapeError::shape(format!(
                        "time-invariant column '{name}' varies across the rows of subject '{key}'"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// `(subject, wave) -> row` for one prefix table.
fn index_prefix_frame(
    frame: &PrefixFrame,
    subjects: &SubjectIndex,
    config: &ReshapeConfig,
) -> Result<HashMap<(String, u32), usize>> {
    let keys = frame.data.column(subjects.column())?;
    let waves = frame.data.column(&config.wave_column)?.i32()?;
    let mut index = HashMap::with_capacity(frame.data.height());
    for row in 0..frame.data.height() {
        let key = any_to_string(keys.get(row)?);
        if subjects.position(&key).is_none() {
            return Err(ReshapeError::shape(format!(
                "prefix '{}' has rows for subject '{key}', which is not in the input",
                frame.prefix
            )));
        }
        let wave = waves
            .get(row)
            .and_then(|wave| u32::try_from(wave).ok())
            .ok_or_else(|| {
                ReshapeError::shape(format!(
                    "prefix '{}' has an invalid wave on row {row}",
                    frame.prefix
                ))
            })?;
        if index.insert((key.clone(), wave), row).is_some() {
            return Err(ReshapeError::shape(format!(
                "prefix '{}' has duplicate rows for subject '{key}' at wave {wave}",
                frame.prefix
            )));
        }
    }
    Ok(index)
}

/// Output column names claimed so far; lookups are case-insensitive.
#[derive(Default)]
struct OutputNames(BTreeSet<String>);

impl OutputNames {
    fn claim(&mut self, name: &str) -> Result<()> {
        if !self.0.insert(name.to_ascii_lowercase()) {
            return Err(ReshapeError::shape(format!(
                "output column '{name}' would be produced twice"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_model::PrefixConfig;

    fn config() -> ReshapeConfig {
        ReshapeConfig::new("id", 2)
            .with_prefix(PrefixConfig::new("r"))
            .with_sequential_years(2000, 2)
    }

    fn invariants() -> DataFrame {
        DataFrame::new(vec![
            Series::new("id".into(), vec!["a", "b"]).into(),
            Series::new("ragender".into(), vec![1i64, 2]).into(),
        ])
        .unwrap()
    }

    fn prefix_frame(keys: Vec<&str>, waves: Vec<i32>, values: Vec<i64>) -> PrefixFrame {
        let data = DataFrame::new(vec![
            Series::new("id".into(), keys).into(),
            Series::new("wave".into(), waves).into(),
            Series::new("R.shlt".into(), values).into(),
        ])
        .unwrap();
        PrefixFrame::new("r", data, vec![2], vec!["R.shlt".to_string()])
    }

    #[test]
    fn fills_the_full_grid() {
        let invariants = invariants();
        let subjects = SubjectIndex::from_frame(&invariants, "id").unwrap();
        let frame = prefix_frame(vec!["a", "b"], vec![2, 2], vec![3, 4]);

        let long = join_long(&invariants, &subjects, &[frame], &config()).unwrap();

        assert_eq!(long.height(), 4);
        let names: Vec<&str> = long
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "wave", "ragender", "R.shlt"]);
        let shlt = long.column("R.shlt").unwrap();
        assert_eq!(shlt.get(0).unwrap(), AnyValue::Null);
        assert_eq!(shlt.get(1).unwrap(), AnyValue::Int64(3));
        assert_eq!(shlt.get(3).unwrap(), AnyValue::Int64(4));
        verify_time_invariants(&long, &subjects, &["ragender"], 2).unwrap();
    }

    #[test]
    fn unknown_subject_is_a_shape_violation() {
        let invariants = invariants();
        let subjects = SubjectIndex::from_frame(&invariants, "id").unwrap();
        let frame = prefix_frame(vec!["a", "z"], vec![2, 2], vec![3, 4]);

        let err = join_long(&invariants, &subjects, &[frame], &config()).unwrap_err();
        assert!(matches!(err, ReshapeError::ShapeInvariantViolation { .. }));
    }

    #[test]
    fn duplicate_prefix_rows_are_a_shape_violation() {
        let invariants = invariants();
        let subjects = SubjectIndex::from_frame(&invariants, "id").unwrap();
        let frame = prefix_frame(vec!["a", "a"], vec![2, 2], vec![3, 4]);

        let err = join_long(&invariants, &subjects, &[frame], &config()).unwrap_err();
        assert!(matches!(err, ReshapeError::ShapeInvariantViolation { .. }));
    }

    #[test]
    fn column_collision_is_a_shape_violation() {
        let invariants = DataFrame::new(vec![
            Series::new("id".into(), vec!["a"]).into(),
            Series::new("Wave".into(), vec![9i64]).into(),
        ])
        .unwrap();
        let subjects = SubjectIndex::from_frame(&invariants, "id").unwrap();

        let err = join_long(&invariants, &subjects, &[], &config()).unwrap_err();
        assert!(matches!(err, ReshapeError::ShapeInvariantViolation { .. }));
    }

    #[test]
    fn varying_invariant_is_detected() {
        let long = DataFrame::new(vec![
            Series::new("id".into(), vec!["a", "a"]).into(),
            Series::new("wave".into(), vec![1i32, 2]).into(),
            Series::new("ragender".into(), vec![1i64, 2]).into(),
        ])
        .unwrap();
        let subjects = SubjectIndex::from_frame(&invariants().head(Some(1)), "id").unwrap();

        let err = verify_time_invariants(&long, &subjects, &["ragender"], 2).unwrap_err();
        assert!(matches!(err, ReshapeError::ShapeInvariantViolation { .. }));
    }
}
