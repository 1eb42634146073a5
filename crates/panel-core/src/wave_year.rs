//! Static wave -> survey year lookup.

use panel_model::ReshapeConfig;
use polars::prelude::*;

use crate::error::{ReshapeError, Result};

/// Add the year column directly after the wave column.
///
/// Every wave in the table must have a configured year.
pub fn apply_wave_years(mut long: DataFrame, config: &ReshapeConfig) -> Result<DataFrame> {
    let waves = long.column(&config.wave_column)?.i32()?;
    let mut years: Vec<Option<i32>> = Vec::with_capacity(waves.len());
    for wave in waves {
        let year = match wave {
            Some(wave) => {
                let year = u32::try_from(wave)
                    .ok()
                    .and_then(|wave| config.year_for_wave(wave));
                Some(year.ok_or_else(|| {
                    ReshapeError::configuration(format!("wave {wave} has no configured year"))
                })?)
            }
            None => None,
        };
        years.push(year);
    }

    if long.column(&config.year_column).is_ok() {
        return Err(ReshapeError::shape(format!(
            "output column '{}' already exists",
            config.year_column
        )));
    }
    let position = long
        .get_column_index(&config.wave_column)
        .map_or(long.width(), |index| index + 1);
    long.insert_column(position, Series::new(config.year_column.as_str().into(), years))?;
    Ok(long)
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_model::PrefixConfig;

    fn config() -> ReshapeConfig {
        ReshapeConfig::new("id", 3)
            .with_prefix(PrefixConfig::new("r"))
            .with_sequential_years(1992, 2)
    }

    #[test]
    fn inserts_year_after_wave() {
        let long = DataFrame::new(vec![
            Series::new("id".into(), vec![1i64, 1, 1]).into(),
            Series::new("wave".into(), vec![1i32, 2, 3]).into(),
            Series::new("R.shlt".into(), vec![Some(2i64), None, Some(3)]).into(),
        ])
        .unwrap();

        let long = apply_wave_years(long, &config()).unwrap();

        assert_eq!(long.get_column_index("year"), Some(2));
        let years: Vec<Option<i32>> = long
            .column("year")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(years, vec![Some(1992), Some(1994), Some(1996)]);
    }

    #[test]
    fn unmapped_wave_is_a_configuration_error() {
        let long = DataFrame::new(vec![Series::new("wave".into(), vec![4i32]).into()]).unwrap();
        let err = apply_wave_years(long, &config()).unwrap_err();
        assert!(matches!(err, ReshapeError::Configuration { .. }));
    }
}
