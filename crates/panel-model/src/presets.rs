//! Built-in configurations for known survey files.

use crate::config::{PrefixConfig, ReshapeConfig};
use crate::error::{ConfigError, Result};

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &["rand-hrs"];

/// Look up a built-in configuration by name.
pub fn preset(name: &str) -> Result<ReshapeConfig> {
    match name.trim().to_ascii_lowercase().as_str() {
        "rand-hrs" | "hrs" => Ok(rand_hrs()),
        _ => Err(ConfigError::UnknownPreset {
            name: name.to_string(),
        }),
    }
}

/// RAND HRS longitudinal file: respondent, spouse and household families over
/// 14 biennial waves (1992-2018), with `inwN` as the in-wave indicator.
pub fn rand_hrs() -> ReshapeConfig {
    ReshapeConfig::new("hhidpn", 14)
        .with_prefix(PrefixConfig::new("r").with_invariant_prefix("ra"))
        .with_prefix(PrefixConfig::new("s"))
        .with_prefix(
            PrefixConfig::new("h")
                .with_invariant_prefix("ha")
                .with_invariant_prefix("hh"),
        )
        .with_in_wave_prefix("inw")
        .with_invariant_column("pn")
        .with_sequential_years(1992, 2)
        .with_required_column("INW")
        .with_required_column("R.shlt")
        .with_range_check("R.shlt", 1.0, 5.0)
        .with_range_check("R.agey_e", 0.0, 120.0)
}
