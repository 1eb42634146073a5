//! Reshape pipeline with explicit stages.
//!
//! The stages run in order, each consuming the complete output of the last:
//! 1. **Preflight**: validate the configuration, apply renames, locate the subject key
//! 2. **Classify**: tag every column as time-invariant or wave-varying
//! 3. **Stubs**: deduplicate `(prefix, concept)` families across digit widths
//! 4. **Reshape**: pivot each prefix's projection into a long table
//! 5. **Join**: merge prefix tables and invariants onto the subject × wave grid
//! 6. **Wave years**: add the calendar year of every wave

use std::time::Instant;

use panel_model::{PrefixSummary, ReshapeConfig};
use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};

use crate::classify::{Classification, classify_columns};
use crate::error::Result;
use crate::join::{join_long, verify_time_invariants};
use crate::preflight::{apply_renames, resolve_subject_column};
use crate::reshape::reshape_prefix;
use crate::stubs::{StubTable, build_stub_table};
use crate::subjects::SubjectIndex;
use crate::wave_year::apply_wave_years;

/// Everything produced by a successful reshape.
#[derive(Debug, Clone)]
pub struct ReshapeOutput {
    /// Long table, one row per `(subject, wave)`.
    pub long: DataFrame,
    pub classification: Classification,
    pub stubs: StubTable,
    /// Per-prefix summaries in configuration order.
    pub prefixes: Vec<PrefixSummary>,
    pub subject_count: usize,
    /// Name of the subject key column as it appears in the output.
    pub subject_column: String,
    /// Time-invariant columns carried onto every row, subject key excluded.
    pub time_invariant_columns: Vec<String>,
    /// Naming inconsistencies and suspicious parses.
    pub warnings: Vec<String>,
}

/// Classify the columns of a wide table without reshaping it.
pub fn classify_wide(
    wide: &DataFrame,
    config: &ReshapeConfig,
) -> Result<(Classification, StubTable)> {
    config.validate()?;
    let wide = apply_renames(wide, config)?;
    resolve_subject_column(&wide, config)?;
    let columns = column_names(&wide);
    let classification = classify_columns(&columns, config)?;
    let stubs = build_stub_table(&classification);
    Ok((classification, stubs))
}

/// Reshape a wide panel table into the long `(subject, wave)` layout.
pub fn reshape_wide(wide: &DataFrame, config: &ReshapeConfig) -> Result<ReshapeOutput> {
    let reshape_span = info_span!(
        "reshape",
        subjects = wide.height(),
        columns = wide.width(),
        max_wave = config.max_wave
    );
    let _reshape_guard = reshape_span.enter();
    let reshape_start = Instant::now();

    let (wide, subject_column) = info_span!("preflight").in_scope(|| -> Result<_> {
        config.validate()?;
        let wide = apply_renames(wide, config)?;
        let subject_column = resolve_subject_column(&wide, config)?;
        Ok((wide, subject_column))
    })?;

    let (classification, stubs) = info_span!("classify").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let classification = classify_columns(&column_names(&wide), config)?;
        let stubs = build_stub_table(&classification);
        info!(
            time_invariant = classification.time_invariant_columns().len(),
            stubs = stubs.len(),
            suspicious = classification.suspicious().len(),
            duration_ms = start.elapsed().as_millis(),
            "classification complete"
        );
        Ok((classification, stubs))
    })?;

    let subjects = SubjectIndex::from_frame(&wide, &subject_column)?;
    let invariant_columns: Vec<String> = classification
        .time_invariant_columns()
        .into_iter()
        .map(str::to_string)
        .collect();
    let invariants = wide.select(invariant_columns.iter().map(String::as_str))?;

    let mut prefix_frames = Vec::with_capacity(config.prefixes.len());
    let mut prefixes = Vec::with_capacity(config.prefixes.len());
    for prefix in &config.prefixes {
        let prefix_span = info_span!("prefix", prefix = %prefix.tag);
        let _prefix_guard = prefix_span.enter();
        let start = Instant::now();

        let mut selection = vec![subject_column.clone()];
        for (_, entry) in stubs.for_prefix(&prefix.tag) {
            selection.extend(entry.waves.values().cloned());
        }
        if selection.len() == 1 {
            warn!("prefix matches no column");
        }
        let projection = wide.select(selection.iter().map(String::as_str))?;
        let frame = reshape_prefix(&projection, &subjects, prefix, &stubs, config)?;
        drop(projection);

        info!(
            stubs = frame.stub_count(),
            waves = frame.waves.len(),
            rows = frame.record_count(),
            duration_ms = start.elapsed().as_millis(),
            "prefix reshaped"
        );
        prefixes.push(PrefixSummary {
            prefix: prefix.tag.clone(),
            stub_count: frame.stub_count(),
            waves: frame.waves.clone(),
            long_rows: frame.record_count(),
        });
        prefix_frames.push(frame);
    }

    let long = info_span!("join").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let long = join_long(&invariants, &subjects, &prefix_frames, config)?;
        let carried: Vec<&str> = invariant_columns
            .iter()
            .map(String::as_str)
            .filter(|name| *name != subject_column)
            .collect();
        verify_time_invariants(&long, &subjects, &carried, config.max_wave)?;
        info!(
            rows = long.height(),
            columns = long.width(),
            duration_ms = start.elapsed().as_millis(),
            "join complete"
        );
        Ok(long)
    })?;
    drop(prefix_frames);

    let long = apply_wave_years(long, config)?;

    let mut warnings: Vec<String> = classification.suspicious().to_vec();
    warnings.extend(
        stubs
            .inconsistencies()
            .iter()
            .filter(|item| item.is_warning())
            .map(|item| item.message()),
    );

    info!(
        subjects = subjects.len(),
        rows = long.height(),
        columns = long.width(),
        warnings = warnings.len(),
        duration_ms = reshape_start.elapsed().as_millis(),
        "reshape complete"
    );

    Ok(ReshapeOutput {
        long,
        classification,
        stubs,
        prefixes,
        subject_count: subjects.len(),
        time_invariant_columns: invariant_columns
            .into_iter()
            .filter(|name| *name != subject_column)
            .collect(),
        subject_column,
        warnings,
    })
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}
