use anyhow::{Context, Result};
use comfy_table::Table;
use panel_cli::pipeline::{self, RunRequest};
use panel_cli::types::{ClassifyResult, RunResult};
use panel_ingest::IngestOptions;
use panel_model::{PRESET_NAMES, ReshapeConfig, preset};

use crate::cli::{ClassifyArgs, ConfigSource, IngestArgs, PresetArgs, RunArgs};
use crate::summary::apply_table_style;

pub fn run_reshape(args: &RunArgs) -> Result<RunResult> {
    let config = load_config(&args.source)?;
    let request = RunRequest {
        output: args.output.clone(),
        report: args.report.clone(),
        dry_run: args.dry_run,
        ingest: ingest_options(&args.ingest),
        ..RunRequest::new(args.input.clone(), config)
    };
    pipeline::run(&request)
}

pub fn run_classify(args: &ClassifyArgs) -> Result<ClassifyResult> {
    let config = load_config(&args.source)?;
    pipeline::classify(&args.input, &config, &ingest_options(&args.ingest))
}

pub fn run_preset(args: &PresetArgs) -> Result<()> {
    let Some(name) = args.name.as_deref() else {
        let mut table = Table::new();
        table.set_header(vec!["Preset", "Subject key", "Waves", "Prefixes"]);
        apply_table_style(&mut table);
        for name in PRESET_NAMES {
            let config = preset(name)?;
            let prefixes: Vec<&str> = config.prefixes.iter().map(|p| p.tag.as_str()).collect();
            table.add_row(vec![
                (*name).to_string(),
                config.subject_key.clone(),
                config.max_wave.to_string(),
                prefixes.join(", "),
            ]);
        }
        println!("{table}");
        return Ok(());
    };
    let config = preset(name)?;
    let json = serde_json::to_string_pretty(&config).context("serialize preset")?;
    println!("{json}");
    Ok(())
}

fn load_config(source: &ConfigSource) -> Result<ReshapeConfig> {
    pipeline::load_config(source.config.as_deref(), source.preset.as_deref())
}

fn ingest_options(args: &IngestArgs) -> IngestOptions {
    IngestOptions {
        null_values: args.null_values.clone(),
        infer_dtypes: args.infer_dtypes,
        ..IngestOptions::default()
    }
}
