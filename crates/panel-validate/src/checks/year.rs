use panel_model::{CheckResult, ReshapeConfig};
use polars::prelude::DataFrame;

use super::{numeric_at, push_sample};

/// Each row's year must equal the configured year of its wave.
pub fn check_year_mapping(long: &DataFrame, config: &ReshapeConfig) -> CheckResult {
    let name = "year_mapping";
    let expected = "year equals the configured year of the wave";
    let (Ok(waves), Ok(years)) = (
        long.column(&config.wave_column),
        long.column(&config.year_column),
    ) else {
        return CheckResult::new(
            name,
            false,
            expected,
            format!(
                "column '{}' or '{}' is absent",
                config.wave_column, config.year_column
            ),
        );
    };

    let mut mismatches = 0usize;
    let mut samples = Vec::new();
    for row in 0..long.height() {
        let wave = numeric_at(waves, row);
        let year = numeric_at(years, row);
        let configured = wave
            .filter(|wave| *wave >= 1.0)
            .and_then(|wave| config.year_for_wave(wave as u32));
        let matches = matches!(
            (configured, year),
            (Some(configured), Some(year)) if f64::from(configured) == year
        );
        if !matches {
            mismatches += 1;
            push_sample(
                &mut samples,
                format!(
                    "row {}: wave {} year {}",
                    row + 1,
                    wave.map_or_else(|| "null".to_string(), |wave| wave.to_string()),
                    year.map_or_else(|| "null".to_string(), |year| year.to_string()),
                ),
            );
        }
    }

    CheckResult::new(
        name,
        mismatches == 0,
        expected,
        format!("{mismatches} mismatched rows"),
    )
    .with_samples(samples)
}
