//! Data model for the panel reshape engine.

pub mod column;
pub mod config;
pub mod error;
pub mod presets;
pub mod report;

pub use column::{ColumnTag, ParsePhase, Stub, WaveColumn};
pub use config::{ColumnRename, MAX_SUPPORTED_WAVE, PrefixConfig, RangeCheck, ReshapeConfig};
pub use error::{ConfigError, Result};
pub use presets::{PRESET_NAMES, preset, rand_hrs};
pub use report::{CheckResult, CheckStatus, PrefixSummary, RunReport, ValidationReport};
