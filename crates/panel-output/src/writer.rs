//! Long table and run report writers.
//!
//! `stage_*` writes only the temp file so several outputs can be published
//! together with [`commit_all`](crate::atomic::commit_all).

use std::path::Path;

use panel_model::RunReport;
use polars::prelude::*;
use tracing::{debug, info};

use crate::atomic::{StagedFile, stage_atomic};
use crate::error::{OutputError, Result};

/// Stage the long table as CSV. Nulls are written as empty cells.
pub fn stage_long_csv(long: &DataFrame, path: &Path) -> Result<StagedFile> {
    let mut frame = long.clone();
    let staged = stage_atomic(path, |writer| {
        CsvWriter::new(writer)
            .include_header(true)
            .finish(&mut frame)
            .map_err(|e| OutputError::Serialization {
                what: "long table",
                source: Box::new(e),
            })
    })?;
    debug!(temp = %staged.temp_path().display(), rows = long.height(), "long table staged");
    Ok(staged)
}

/// Stage the run report as pretty-printed JSON.
pub fn stage_report_json(report: &RunReport, path: &Path) -> Result<StagedFile> {
    let staged = stage_atomic(path, |writer| {
        serde_json::to_writer_pretty(writer, report).map_err(|e| OutputError::Serialization {
            what: "run report",
            source: Box::new(e),
        })
    })?;
    debug!(temp = %staged.temp_path().display(), "run report staged");
    Ok(staged)
}

/// Write the long table as CSV.
pub fn write_long_csv(long: &DataFrame, path: &Path) -> Result<()> {
    stage_long_csv(long, path)?.commit()?;
    info!(
        path = %path.display(),
        rows = long.height(),
        columns = long.width(),
        "long table written"
    );
    Ok(())
}

/// Write the run report as JSON.
pub fn write_report_json(report: &RunReport, path: &Path) -> Result<()> {
    stage_report_json(report, path)?.commit()?;
    info!(path = %path.display(), "run report written");
    Ok(())
}
