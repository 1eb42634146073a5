//! Per-prefix wide-to-long pivot.

use panel_model::{PrefixConfig, ReshapeConfig};
use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::frame::{PrefixFrame, gather_column, wave_series};
use crate::stubs::StubTable;
use crate::subjects::SubjectIndex;

/// Pivot one prefix's wide columns into a long table.
///
/// `wide` must contain the subject key and every source column of the
/// prefix's stubs; it is typically a projection of the full input. Rows are
/// subjects in input order, then the prefix's waves ascending. A cell is
/// populated only when the stub's source column exists for that wave.
pub fn reshape_prefix(
    wide: &DataFrame,
    subjects: &SubjectIndex,
    prefix: &PrefixConfig,
    stubs: &StubTable,
    config: &ReshapeConfig,
) -> Result<PrefixFrame> {
    let waves: Vec<u32> = stubs.waves_for_prefix(&prefix.tag).into_iter().collect();
    let subject_count = subjects.len();

    let subject_rows: Vec<Option<usize>> = (0..subject_count)
        .flat_map(|subject| std::iter::repeat_n(Some(subject), waves.len()))
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(2 + stubs.len());
    columns.push(gather_column(
        wide.column(subjects.column())?,
        &subject_rows,
        subjects.column(),
    )?);
    columns.push(
        wave_series(
            &config.wave_column,
            (0..subject_count).flat_map(|_| waves.iter().copied()),
        )
        .into(),
    );

    let mut stub_columns = Vec::new();
    for (stub, entry) in stubs.for_prefix(&prefix.tag) {
        let name = config.stub_column_name(&prefix.tag, &stub.concept);
        let mut sources: Vec<Option<&Column>> = Vec::with_capacity(waves.len());
        for wave in &waves {
            sources.push(match entry.source_column(*wave) {
                Some(source) => Some(wide.column(source)?),
                None => None,
            });
        }

        let column = if share_dtype(sources.iter().flatten().copied()) {
            stack_sources(&sources, subject_count, &name)?
        } else {
            infer_from_values(&sources, subject_count, &name)?
        };
        debug!(
            stub = %stub,
            column = %name,
            waves = ?entry.observed_waves(),
            dtype = %column.dtype(),
            "stub reshaped"
        );
        columns.push(column);
        stub_columns.push(name);
    }

    let data = DataFrame::new(columns)?;
    Ok(PrefixFrame::new(prefix.tag.clone(), data, waves, stub_columns))
}

/// Stack the per-wave source columns and gather each `(subject, wave)` cell
/// from the stack. Every source must share one dtype.
fn stack_sources(sources: &[Option<&Column>], subject_count: usize, name: &str) -> Result<Column> {
    let mut stacked: Option<Column> = None;
    let mut blocks: Vec<Option<usize>> = Vec::with_capacity(sources.len());
    let mut next_block = 0usize;
    for source in sources {
        let Some(column) = source else {
            blocks.push(None);
            continue;
        };
        match stacked.as_mut() {
            Some(stack) => {
                stack.append(column)?;
            }
            None => stacked = Some((*column).clone()),
        }
        blocks.push(Some(next_block));
        next_block += 1;
    }
    let Some(stacked) = stacked else {
        return infer_from_values(sources, subject_count, name);
    };
    let rows: Vec<Option<usize>> = (0..subject_count)
        .flat_map(|subject| {
            blocks
                .iter()
                .map(move |block| block.map(|block| block * subject_count + subject))
        })
        .collect();
    gather_column(&stacked, &rows, name)
}

/// Sources with differing dtypes: the supertype is inferred from the values.
fn infer_from_values(
    sources: &[Option<&Column>],
    subject_count: usize,
    name: &str,
) -> Result<Column> {
    let mut values: Vec<AnyValue<'_>> = Vec::with_capacity(subject_count * sources.len());
    for subject in 0..subject_count {
        for source in sources {
            values.push(match source {
                Some(column) => column.get(subject)?,
                None => AnyValue::Null,
            });
        }
    }
    Ok(Series::from_any_values(name.into(), &values, false)?.into())
}

/// True when every source column has the same dtype (and there is at least
/// one source).
fn share_dtype<'a>(mut sources: impl Iterator<Item = &'a Column>) -> bool {
    let Some(first) = sources.next() else {
        return false;
    };
    sources.all(|column| column.dtype() == first.dtype())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_columns;
    use crate::stubs::build_stub_table;

    fn config() -> ReshapeConfig {
        ReshapeConfig::new("id", 3)
            .with_prefix(PrefixConfig::new("r"))
            .with_sequential_years(2000, 2)
    }

    fn reshape(df: &DataFrame) -> PrefixFrame {
        let config = config();
        let columns: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let classification = classify_columns(&columns, &config).unwrap();
        let stubs = build_stub_table(&classification);
        let subjects = SubjectIndex::from_frame(df, "id").unwrap();
        reshape_prefix(df, &subjects, &config.prefixes[0], &stubs, &config).unwrap()
    }

    #[test]
    fn places_values_at_their_wave() {
        let df = DataFrame::new(vec![
            Series::new("id".into(), vec![1i64, 2]).into(),
            Series::new("r1shlt".into(), vec![Some(3i64), None]).into(),
            Series::new("r3shlt".into(), vec![4i64, 5]).into(),
        ])
        .unwrap();
        let frame = reshape(&df);

        assert_eq!(frame.waves, vec![1, 3]);
        assert_eq!(frame.stub_columns, vec!["R.shlt".to_string()]);
        assert_eq!(frame.record_count(), 4);
        let shlt = frame.data.column("R.shlt").unwrap();
        assert_eq!(shlt.dtype(), &DataType::Int64);
        assert_eq!(shlt.get(0).unwrap(), AnyValue::Int64(3));
        assert_eq!(shlt.get(1).unwrap(), AnyValue::Int64(4));
        assert_eq!(shlt.get(2).unwrap(), AnyValue::Null);
        assert_eq!(shlt.get(3).unwrap(), AnyValue::Int64(5));
    }

    #[test]
    fn stub_without_source_column_stays_null() {
        let df = DataFrame::new(vec![
            Series::new("id".into(), vec![1i64]).into(),
            Series::new("r1shlt".into(), vec![3i64]).into(),
            Series::new("r2cesd".into(), vec![0i64]).into(),
        ])
        .unwrap();
        let frame = reshape(&df);

        assert_eq!(frame.waves, vec![1, 2]);
        let cesd = frame.data.column("R.cesd").unwrap();
        assert_eq!(cesd.get(0).unwrap(), AnyValue::Null);
        assert_eq!(cesd.get(1).unwrap(), AnyValue::Int64(0));
    }

    #[test]
    fn text_values_are_stacked_verbatim() {
        let df = DataFrame::new(vec![
            Series::new("id".into(), vec!["010", "020"]).into(),
            Series::new("r1code".into(), vec![Some("07"), None]).into(),
            Series::new("r3code".into(), vec!["08", "09"]).into(),
        ])
        .unwrap();
        let frame = reshape(&df);

        let id = frame.data.column("id").unwrap();
        assert_eq!(id.get(2).unwrap(), AnyValue::String("020"));
        let code = frame.data.column("R.code").unwrap();
        assert_eq!(code.dtype(), &DataType::String);
        assert_eq!(code.get(0).unwrap(), AnyValue::String("07"));
        assert_eq!(code.get(1).unwrap(), AnyValue::String("08"));
        assert_eq!(code.get(2).unwrap(), AnyValue::Null);
        assert_eq!(code.get(3).unwrap(), AnyValue::String("09"));
    }

    #[test]
    fn mixed_dtypes_use_a_supertype() {
        let df = DataFrame::new(vec![
            Series::new("id".into(), vec![1i64]).into(),
            Series::new("r1bmi".into(), vec![22i64]).into(),
            Series::new("r2bmi".into(), vec![23.5f64]).into(),
        ])
        .unwrap();
        let frame = reshape(&df);

        let bmi = frame.data.column("R.bmi").unwrap();
        assert_eq!(bmi.dtype(), &DataType::Float64);
        assert_eq!(bmi.get(1).unwrap(), AnyValue::Float64(23.5));
    }
}
