//! CLI argument definitions for `panel-reshape`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "panel-reshape",
    version,
    about = "Reshape wide longitudinal survey files into long panel tables",
    long_about = "Reshape a wide survey file (one row per subject, columns named \
                  prefix + wave + concept) into a long table with one row per \
                  (subject, wave).\n\n\
                  Writes the long table as CSV and a JSON run report with \
                  validation results and file digests."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reshape a wide file and write the long table and run report.
    Run(RunArgs),

    /// Print the column classification and stub table of a wide file.
    Classify(ClassifyArgs),

    /// Print a built-in configuration as JSON (lists presets when no name is given).
    Preset(PresetArgs),
}

/// Where the reshape configuration comes from.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct ConfigSource {
    /// Reshape configuration JSON file.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Built-in configuration name (see `panel-reshape preset`).
    #[arg(long = "preset", value_name = "NAME")]
    pub preset: Option<String>,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Cell value read as missing, in addition to empty cells (repeatable).
    #[arg(long = "null-value", value_name = "TEXT", default_values_t = [".".to_string()])]
    pub null_values: Vec<String>,

    /// Infer numeric column types instead of keeping every cell as text.
    #[arg(long = "infer-dtypes")]
    pub infer_dtypes: bool,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Wide CSV file, one row per subject.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub source: ConfigSource,

    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Long CSV output (default: <INPUT stem>_long.csv next to the input).
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Run report JSON (default: <OUTPUT stem>.report.json).
    #[arg(long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Reshape and validate without writing any file.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ClassifyArgs {
    /// Wide CSV file, one row per subject.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub source: ConfigSource,

    #[command(flatten)]
    pub ingest: IngestArgs,
}

#[derive(Parser)]
pub struct PresetArgs {
    /// Preset name.
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
