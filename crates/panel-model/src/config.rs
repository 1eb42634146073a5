//! Reshape configuration value object.
//!
//! Everything the engine needs to know about a survey file that cannot be
//! inferred from column names alone: the entity prefixes and their reserved
//! time-invariant sub-prefixes, the subject key, the number of waves, and the
//! static wave-to-year calendar.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Largest wave index the two-digit naming grammar can express.
pub const MAX_SUPPORTED_WAVE: u32 = 99;

fn default_wave_column() -> String {
    "wave".to_string()
}

fn default_year_column() -> String {
    "year".to_string()
}

/// One entity family (respondent, spouse, household, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixConfig {
    /// Leading characters of every column in this family (e.g. `r`).
    pub tag: String,
    /// Output label used when naming stub columns. Defaults to the tag uppercased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Sub-prefixes under this tag that denote time-invariant columns (e.g. `ra`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invariant_prefixes: Vec<String>,
}

impl PrefixConfig {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            label: None,
            invariant_prefixes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_invariant_prefix(mut self, sub_prefix: impl Into<String>) -> Self {
        self.invariant_prefixes.push(sub_prefix.into());
        self
    }

    /// Label used for output column names.
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.tag.to_uppercase())
    }
}

/// Column rename applied before classification to remove naming collisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

/// Plausible numeric range for a known-scale output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCheck {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

/// Complete configuration for one reshape run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReshapeConfig {
    /// Column holding the immutable subject identifier.
    pub subject_key: String,
    /// Entity prefixes, in output order.
    pub prefixes: Vec<PrefixConfig>,
    /// Prefix whose zero-concept stub is the in-wave interview indicator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_wave_prefix: Option<String>,
    /// Columns that are time-invariant although they match no sub-prefix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invariant_columns: Vec<String>,
    /// Number of waves; output has exactly this many rows per subject.
    pub max_wave: u32,
    /// Primary survey year of every wave in `1..=max_wave`.
    pub wave_years: BTreeMap<u32, i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<ColumnRename>,
    /// Output columns the validator expects to find.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub range_checks: Vec<RangeCheck>,
    #[serde(default = "default_wave_column")]
    pub wave_column: String,
    #[serde(default = "default_year_column")]
    pub year_column: String,
}

impl ReshapeConfig {
    /// Create a configuration with no prefixes and an empty calendar.
    pub fn new(subject_key: impl Into<String>, max_wave: u32) -> Self {
        Self {
            subject_key: subject_key.into(),
            prefixes: Vec::new(),
            in_wave_prefix: None,
            invariant_columns: Vec::new(),
            max_wave,
            wave_years: BTreeMap::new(),
            renames: Vec::new(),
            required_columns: Vec::new(),
            range_checks: Vec::new(),
            wave_column: default_wave_column(),
            year_column: default_year_column(),
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: PrefixConfig) -> Self {
        self.prefixes.push(prefix);
        self
    }

    /// Register `tag` as a prefix and mark its bare stub as the in-wave indicator.
    #[must_use]
    pub fn with_in_wave_prefix(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if self.prefix(&tag).is_none() {
            self.prefixes.push(PrefixConfig::new(tag.clone()));
        }
        self.in_wave_prefix = Some(tag);
        self
    }

    #[must_use]
    pub fn with_invariant_column(mut self, column: impl Into<String>) -> Self {
        self.invariant_columns.push(column.into());
        self
    }

    #[must_use]
    pub fn with_wave_year(mut self, wave: u32, year: i32) -> Self {
        self.wave_years.insert(wave, year);
        self
    }

    /// Fill the calendar as `first_year + step * (wave - 1)` for every wave.
    #[must_use]
    pub fn with_sequential_years(mut self, first_year: i32, step: i32) -> Self {
        for wave in 1..=self.max_wave {
            let offset = i32::try_from(wave - 1).unwrap_or(i32::MAX);
            self.wave_years
                .insert(wave, first_year.saturating_add(step.saturating_mul(offset)));
        }
        self
    }

    #[must_use]
    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.push(ColumnRename {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    #[must_use]
    pub fn with_required_column(mut self, column: impl Into<String>) -> Self {
        self.required_columns.push(column.into());
        self
    }

    #[must_use]
    pub fn with_range_check(mut self, column: impl Into<String>, min: f64, max: f64) -> Self {
        self.range_checks.push(RangeCheck {
            column: column.into(),
            min,
            max,
        });
        self
    }

    /// All waves of the canonical grid.
    pub fn waves(&self) -> RangeInclusive<u32> {
        1..=self.max_wave
    }

    pub fn prefix(&self, tag: &str) -> Option<&PrefixConfig> {
        self.prefixes
            .iter()
            .find(|prefix| prefix.tag.eq_ignore_ascii_case(tag))
    }

    pub fn year_for_wave(&self, wave: u32) -> Option<i32> {
        self.wave_years.get(&wave).copied()
    }

    /// Output column name of the stub `(tag, concept)`.
    ///
    /// The zero-concept stub is named by the label alone.
    pub fn stub_column_name(&self, tag: &str, concept: &str) -> String {
        let label = self
            .prefix(tag)
            .map(PrefixConfig::label)
            .unwrap_or_else(|| tag.to_uppercase());
        if concept.is_empty() {
            label
        } else {
            format!("{label}.{concept}")
        }
    }

    /// Output column of the in-wave indicator, if one is configured.
    pub fn in_wave_column(&self) -> Option<String> {
        self.in_wave_prefix
            .as_deref()
            .map(|tag| self.stub_column_name(tag, ""))
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.subject_key.trim().is_empty() {
            return Err(ConfigError::EmptySubjectKey);
        }
        if self.prefixes.is_empty() {
            return Err(ConfigError::NoPrefixes);
        }
        if self.max_wave == 0 || self.max_wave > MAX_SUPPORTED_WAVE {
            return Err(ConfigError::MaxWaveOutOfRange {
                max_wave: self.max_wave,
            });
        }

        let mut seen = BTreeSet::new();
        for prefix in &self.prefixes {
            if prefix.tag.is_empty() {
                return Err(ConfigError::EmptyPrefix);
            }
            if prefix.tag.ends_with(|ch: char| ch.is_ascii_digit()) {
                return Err(ConfigError::PrefixEndsWithDigit {
                    tag: prefix.tag.clone(),
                });
            }
            if !seen.insert(prefix.tag.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicatePrefix {
                    tag: prefix.tag.clone(),
                });
            }
            let tag_lower = prefix.tag.to_ascii_lowercase();
            for sub_prefix in &prefix.invariant_prefixes {
                let sub_lower = sub_prefix.to_ascii_lowercase();
                if sub_lower.len() <= tag_lower.len() || !sub_lower.starts_with(&tag_lower) {
                    return Err(ConfigError::InvariantOutsidePrefix {
                        tag: prefix.tag.clone(),
                        sub_prefix: sub_prefix.clone(),
                    });
                }
            }
        }

        if let Some(tag) = &self.in_wave_prefix
            && self.prefix(tag).is_none()
        {
            return Err(ConfigError::UnknownInWavePrefix { tag: tag.clone() });
        }

        for wave in self.waves() {
            if !self.wave_years.contains_key(&wave) {
                return Err(ConfigError::MissingWaveYear { wave });
            }
        }
        if let Some((&wave, _)) = self
            .wave_years
            .iter()
            .find(|(wave, _)| **wave == 0 || **wave > self.max_wave)
        {
            return Err(ConfigError::ExtraWaveYear {
                wave,
                max_wave: self.max_wave,
            });
        }

        let mut renamed = BTreeSet::new();
        for rename in &self.renames {
            if !renamed.insert(rename.from.as_str()) {
                return Err(ConfigError::DuplicateRename {
                    from: rename.from.clone(),
                });
            }
        }

        for check in &self.range_checks {
            if check.min > check.max {
                return Err(ConfigError::InvertedRange {
                    column: check.column.clone(),
                    min: check.min,
                    max: check.max,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_wave() -> ReshapeConfig {
        ReshapeConfig::new("id", 3)
            .with_prefix(PrefixConfig::new("r").with_invariant_prefix("ra"))
            .with_sequential_years(2000, 2)
    }

    #[test]
    fn sequential_years_cover_every_wave() {
        let config = three_wave();
        assert_eq!(config.year_for_wave(1), Some(2000));
        assert_eq!(config.year_for_wave(3), Some(2004));
        assert_eq!(config.year_for_wave(4), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stub_column_names_use_label() {
        let config = three_wave()
            .with_prefix(PrefixConfig::new("s").with_label("SP"))
            .with_in_wave_prefix("inw");
        assert_eq!(config.stub_column_name("r", "shlt"), "R.shlt");
        assert_eq!(config.stub_column_name("s", "shlt"), "SP.shlt");
        assert_eq!(config.in_wave_column().as_deref(), Some("INW"));
    }

    #[test]
    fn rejects_incomplete_calendar() {
        let config = ReshapeConfig::new("id", 3)
            .with_prefix(PrefixConfig::new("r"))
            .with_wave_year(1, 2000)
            .with_wave_year(3, 2004);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingWaveYear { wave: 2 })
        );
    }

    #[test]
    fn rejects_calendar_beyond_max_wave() {
        let config = three_wave().with_wave_year(4, 2006);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ExtraWaveYear {
                wave: 4,
                max_wave: 3
            })
        );
    }

    #[test]
    fn rejects_sub_prefix_outside_its_prefix() {
        let config = ReshapeConfig::new("id", 1)
            .with_prefix(PrefixConfig::new("r").with_invariant_prefix("ha"))
            .with_sequential_years(2000, 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvariantOutsidePrefix { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_prefix_case_insensitively() {
        let config = three_wave().with_prefix(PrefixConfig::new("R"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicatePrefix { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_max_wave() {
        let config = ReshapeConfig::new("id", 0).with_prefix(PrefixConfig::new("r"));
        assert_eq!(
            config.validate(),
            Err(ConfigError::MaxWaveOutOfRange { max_wave: 0 })
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "subject_key": "hhidpn",
            "prefixes": [{"tag": "r", "invariant_prefixes": ["ra"]}],
            "max_wave": 2,
            "wave_years": {"1": 1992, "2": 1994}
        }"#;
        let config: ReshapeConfig = serde_json::from_str(json).expect("parse config");
        assert_eq!(config.wave_column, "wave");
        assert_eq!(config.year_column, "year");
        assert_eq!(config.year_for_wave(2), Some(1994));
        assert!(config.validate().is_ok());
    }
}
