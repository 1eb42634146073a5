//! Run orchestration with explicit stages.
//!
//! 1. **Ingest**: read the wide CSV and digest it
//! 2. **Reshape**: classify, reshape and join via `panel_core`
//! 3. **Validate**: run the diagnostic battery
//! 4. **Output**: write the long CSV and the JSON run report atomically
//!
//! Any fatal error stops the run before stage 4, so nothing is written.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use panel_core::{ReshapeError, ReshapeOutput, classify_wide, reshape_wide};
use panel_ingest::{IngestOptions, read_wide_csv};
use panel_model::{ReshapeConfig, RunReport, preset};
use panel_output::{commit_all, compute_file_hash, stage_long_csv, stage_report_json};
use panel_validate::{ValidationContext, validate_long};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use crate::types::{ClassifyResult, RunResult};

/// Everything `run` needs; built from CLI arguments.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: PathBuf,
    pub config: ReshapeConfig,
    /// Long CSV path; defaults to `<input stem>_long.csv` next to the input.
    pub output: Option<PathBuf>,
    /// Report path; defaults to `<output stem>.report.json`.
    pub report: Option<PathBuf>,
    pub dry_run: bool,
    pub ingest: IngestOptions,
}

impl RunRequest {
    pub fn new(input: impl Into<PathBuf>, config: ReshapeConfig) -> Self {
        Self {
            input: input.into(),
            config,
            output: None,
            report: None,
            dry_run: false,
            ingest: IngestOptions::default(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }

    pub fn report_path(&self) -> PathBuf {
        self.report
            .clone()
            .unwrap_or_else(|| self.output_path().with_extension("report.json"))
    }
}

/// `data/hrs.csv` -> `data/hrs_long.csv`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "panel".to_string());
    input.with_file_name(format!("{stem}_long.csv"))
}

/// Load a configuration from a JSON file or a built-in preset.
pub fn load_config(config_path: Option<&Path>, preset_name: Option<&str>) -> Result<ReshapeConfig> {
    let config = match (config_path, preset_name) {
        (Some(path), _) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            serde_json::from_str::<ReshapeConfig>(&text)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        (None, Some(name)) => preset(name)?,
        (None, None) => return Err(anyhow!("either --config or --preset is required")),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Run ingest, reshape, validation and output.
pub fn run(request: &RunRequest) -> Result<RunResult> {
    let run_span = info_span!("run", input = %request.input.display());
    let _run_guard = run_span.enter();
    let run_start = Instant::now();

    let (wide, input_sha256) = ingest(&request.input, &request.ingest)?;
    let output = reshape(&wide, &request.config)?;
    drop(wide);

    let validation = info_span!("validate").in_scope(|| {
        validate_long(
            &output.long,
            &request.config,
            ValidationContext {
                subject_column: &output.subject_column,
                subject_count: output.subject_count,
            },
        )
    });

    let mut report = RunReport::new(output.subject_count, request.config.max_wave);
    report.input = Some(request.input.clone());
    report.input_sha256 = Some(input_sha256);
    report.row_count = output.long.height();
    report.column_count = output.long.width();
    report.time_invariant_columns = output.time_invariant_columns.len();
    report.prefixes = output.prefixes.clone();
    report.warnings = output.warnings.clone();
    report.validation = validation;

    if request.dry_run {
        info!(
            duration_ms = run_start.elapsed().as_millis(),
            "dry run complete, nothing written"
        );
        return Ok(RunResult {
            report,
            report_path: None,
            dry_run: true,
        });
    }

    let output_path = request.output_path();
    let report_path = request.report_path();
    info_span!("output").in_scope(|| -> Result<()> {
        let long_file = stage_long_csv(&output.long, &output_path)
            .with_context(|| format!("write {}", output_path.display()))?;
        report.output = Some(output_path.clone());
        report.output_sha256 = Some(compute_file_hash(long_file.temp_path())?);
        let report_file = stage_report_json(&report, &report_path)
            .with_context(|| format!("write {}", report_path.display()))?;
        commit_all(vec![long_file, report_file]).context("publish run outputs")?;
        info!(
            output = %output_path.display(),
            report = %report_path.display(),
            "run outputs written"
        );
        Ok(())
    })?;

    info!(
        rows = report.row_count,
        failed_checks = report.validation.failure_count(),
        duration_ms = run_start.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunResult {
        report,
        report_path: Some(report_path),
        dry_run: false,
    })
}

/// Classify the columns of a wide file without reshaping it.
pub fn classify(
    input: &Path,
    config: &ReshapeConfig,
    options: &IngestOptions,
) -> Result<ClassifyResult> {
    let (wide, _) = ingest(input, options)?;
    let (classification, stubs) = classify_wide(&wide, config).map_err(reshape_failure)?;
    Ok(ClassifyResult {
        input: input.to_path_buf(),
        classification,
        stubs,
    })
}

fn ingest(input: &Path, options: &IngestOptions) -> Result<(DataFrame, String)> {
    info_span!("ingest").in_scope(|| {
        let start = Instant::now();
        let wide = read_wide_csv(input, options)
            .with_context(|| format!("load {}", input.display()))?;
        let digest = compute_file_hash(input)?;
        info!(
            subjects = wide.height(),
            columns = wide.width(),
            duration_ms = start.elapsed().as_millis(),
            "ingest complete"
        );
        Ok((wide, digest))
    })
}

fn reshape(wide: &DataFrame, config: &ReshapeConfig) -> Result<ReshapeOutput> {
    reshape_wide(wide, config).map_err(reshape_failure)
}

/// Keep the error category visible in the top-level message.
fn reshape_failure(error: ReshapeError) -> anyhow::Error {
    let kind = error.kind();
    anyhow::Error::new(error).context(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_next_to_input() {
        let request = RunRequest::new("data/hrs.csv", panel_model::rand_hrs());
        assert_eq!(request.output_path(), PathBuf::from("data/hrs_long.csv"));
        assert_eq!(request.report_path(), PathBuf::from("data/hrs_long.report.json"));
    }

    #[test]
    fn config_source_is_required() {
        assert!(load_config(None, None).is_err());
        assert!(load_config(None, Some("rand-hrs")).is_ok());
        assert!(load_config(None, Some("unknown")).is_err());
    }
}
