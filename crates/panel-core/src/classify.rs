//! Column grammar classification.
//!
//! Wave-varying columns are named `prefix + wave + concept`, where waves 1-9
//! are written with one digit and waves 10+ with two. `r10x` could therefore
//! be wave 10 concept `x` or wave 1 concept `0x`. Classification is two-phase
//! and prefix-scoped:
//!
//! 1. **Double-digit phase**: the digit run after the prefix is read greedily;
//!    if its value lies in `[10, max_wave]` the run is the wave.
//! 2. **Single-digit phase**: every other column takes its first digit as the
//!    wave and the remainder as the concept.
//!
//! Reserved invariant sub-prefixes (e.g. `ra` under `r`) are removed before
//! either phase runs. A double-digit column whose single-digit reading names a
//! concept that other columns of the prefix actually use is rejected as
//! ambiguous, as is any pair of columns resolving to the same
//! `(prefix, wave, concept)` triple.

use std::collections::{BTreeMap, BTreeSet};

use panel_model::{ColumnTag, ParsePhase, PrefixConfig, ReshapeConfig, WaveColumn};
use tracing::{debug, warn};

use crate::error::{ReshapeError, Result};

/// Immutable map from every input column to its tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    columns: Vec<String>,
    tags: BTreeMap<String, ColumnTag>,
    suspicious: Vec<String>,
}

impl Classification {
    /// Tag of a column, if it was part of the input.
    pub fn tag(&self, column: &str) -> Option<&ColumnTag> {
        self.tags.get(column)
    }

    /// Columns in input order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Time-invariant columns in input order.
    pub fn time_invariant_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| {
                self.tags
                    .get(column.as_str())
                    .is_some_and(ColumnTag::is_time_invariant)
            })
            .map(String::as_str)
            .collect()
    }

    /// Wave-varying columns in input order.
    pub fn wave_columns(&self) -> impl Iterator<Item = (&str, &WaveColumn)> {
        self.columns.iter().filter_map(|column| {
            self.tags
                .get(column.as_str())
                .and_then(ColumnTag::wave_column)
                .map(|wave| (column.as_str(), wave))
        })
    }

    /// Parses accepted by the heuristic that could plausibly be wrong.
    pub fn suspicious(&self) -> &[String] {
        &self.suspicious
    }
}

/// A column owned by a prefix, split into its digit run and remainder.
struct PendingColumn<'a> {
    column: &'a str,
    prefix: &'a PrefixConfig,
    digits: &'a str,
    rest: &'a str,
}

/// Classify every column name against the configured grammar.
pub fn classify_columns(columns: &[String], config: &ReshapeConfig) -> Result<Classification> {
    config.validate()?;

    let invariant_columns: BTreeSet<String> = config
        .invariant_columns
        .iter()
        .chain(std::iter::once(&config.subject_key))
        .map(|column| column.to_ascii_lowercase())
        .collect();

    // Longest tag first so that e.g. `inw` wins over a hypothetical `i`.
    let mut prefixes: Vec<&PrefixConfig> = config.prefixes.iter().collect();
    prefixes.sort_by(|a, b| b.tag.len().cmp(&a.tag.len()).then(a.tag.cmp(&b.tag)));

    let mut sub_prefix_hits: BTreeMap<String, usize> = config
        .prefixes
        .iter()
        .flat_map(|prefix| prefix.invariant_prefixes.iter())
        .map(|sub_prefix| (sub_prefix.to_ascii_lowercase(), 0))
        .collect();

    let mut tags: BTreeMap<String, ColumnTag> = BTreeMap::new();
    let mut pending: Vec<PendingColumn<'_>> = Vec::new();

    for column in columns {
        let lower = column.to_ascii_lowercase();
        if invariant_columns.contains(&lower) {
            insert_tag(&mut tags, column, ColumnTag::TimeInvariant)?;
            continue;
        }
        // Overlapping sub-prefixes (`ha`, `hac`) credit the longest match.
        if let Some(hits) = sub_prefix_hits
            .iter_mut()
            .filter(|(sub_prefix, _)| lower.starts_with(sub_prefix.as_str()))
            .max_by_key(|(sub_prefix, _)| sub_prefix.len())
            .map(|(_, hits)| hits)
        {
            *hits += 1;
            insert_tag(&mut tags, column, ColumnTag::TimeInvariant)?;
            continue;
        }
        let Some(owned) = split_owned_column(column, &prefixes) else {
            return Err(ReshapeError::configuration(format!(
                "column '{column}' matches no configured prefix, invariant sub-prefix or invariant column"
            )));
        };
        pending.push(owned);
    }

    if let Some((sub_prefix, _)) = sub_prefix_hits.iter().find(|(_, hits)| **hits == 0) {
        return Err(ReshapeError::configuration(format!(
            "invariant sub-prefix '{sub_prefix}' matches no column"
        )));
    }

    let mut parsed: Vec<(&str, WaveColumn)> = Vec::with_capacity(pending.len());
    let mut single_digit = Vec::new();

    // Double-digit phase.
    for item in &pending {
        match double_digit_wave(item.digits, config.max_wave) {
            Some(wave) => parsed.push((
                item.column,
                WaveColumn {
                    prefix: item.prefix.tag.clone(),
                    wave,
                    raw_concept: item.rest.to_string(),
                    phase: ParsePhase::DoubleDigit,
                },
            )),
            None => single_digit.push(item),
        }
    }
    let double_digit_count = parsed.len();

    // Single-digit phase.
    let mut suspicious = Vec::new();
    for item in single_digit {
        let wave = item
            .digits
            .chars()
            .next()
            .and_then(|ch| ch.to_digit(10))
            .unwrap_or(0);
        if wave == 0 {
            return Err(ReshapeError::configuration(format!(
                "column '{}' has wave index 0",
                item.column
            )));
        }
        if wave > config.max_wave {
            return Err(ReshapeError::configuration(format!(
                "column '{}' refers to wave {wave}, beyond max_wave {}",
                item.column, config.max_wave
            )));
        }
        let raw_concept = format!("{}{}", &item.digits[1..], item.rest);
        if raw_concept.starts_with(|ch: char| ch.is_ascii_digit()) {
            let message = format!(
                "column '{}' parsed as wave {wave} concept '{raw_concept}', which begins with a digit",
                item.column
            );
            warn!(
                column = item.column,
                wave,
                concept = %raw_concept,
                "concept begins with a digit"
            );
            suspicious.push(message);
        }
        parsed.push((
            item.column,
            WaveColumn {
                prefix: item.prefix.tag.clone(),
                wave,
                raw_concept,
                phase: ParsePhase::SingleDigit,
            },
        ));
    }

    check_alternative_parses(&parsed)?;
    check_duplicate_triples(&parsed)?;

    let wave_varying = parsed.len();
    for (column, wave_column) in parsed {
        insert_tag(&mut tags, column, ColumnTag::WaveVarying(wave_column))?;
    }

    debug!(
        columns = columns.len(),
        wave_varying,
        double_digit = double_digit_count,
        time_invariant = columns.len() - wave_varying,
        "columns classified"
    );

    Ok(Classification {
        columns: columns.to_vec(),
        tags,
        suspicious,
    })
}

fn insert_tag(tags: &mut BTreeMap<String, ColumnTag>, column: &str, tag: ColumnTag) -> Result<()> {
    if tags.insert(column.to_string(), tag).is_some() {
        return Err(ReshapeError::ambiguity(column, "column name appears more than once"));
    }
    Ok(())
}

/// Find the owning prefix of a column: the longest tag followed by a digit.
fn split_owned_column<'a>(
    column: &'a str,
    prefixes: &[&'a PrefixConfig],
) -> Option<PendingColumn<'a>> {
    prefixes.iter().copied().find_map(|prefix| {
        let tag_len = prefix.tag.len();
        let head = column.get(..tag_len)?;
        if !head.eq_ignore_ascii_case(&prefix.tag) {
            return None;
        }
        let tail = &column[tag_len..];
        let digit_len = tail
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(tail.len());
        if digit_len == 0 {
            return None;
        }
        Some(PendingColumn {
            column,
            prefix,
            digits: &tail[..digit_len],
            rest: &tail[digit_len..],
        })
    })
}

/// Wave of a greedy digit run if it is an unambiguous double-digit wave.
fn double_digit_wave(digits: &str, max_wave: u32) -> Option<u32> {
    if digits.len() < 2 {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    (10..=max_wave).contains(&value).then_some(value)
}

/// Reject double-digit columns whose single-digit reading is also plausible.
fn check_alternative_parses(parsed: &[(&str, WaveColumn)]) -> Result<()> {
    let single_digit_concepts: BTreeMap<(String, String), &str> = parsed
        .iter()
        .filter(|(_, wave)| wave.phase == ParsePhase::SingleDigit)
        .map(|(column, wave)| ((wave.prefix.clone(), wave.concept()), *column))
        .collect();

    for (column, wave) in parsed
        .iter()
        .filter(|(_, wave)| wave.phase == ParsePhase::DoubleDigit)
    {
        let tag_len = wave.prefix.len();
        let tail = &column[tag_len..];
        let mut chars = tail.chars();
        let Some(alt_wave) = chars.next().and_then(|ch| ch.to_digit(10)) else {
            continue;
        };
        if alt_wave == 0 {
            continue;
        }
        let alt_concept = chars.as_str().to_ascii_lowercase();
        if let Some(other) = single_digit_concepts.get(&(wave.prefix.clone(), alt_concept.clone()))
        {
            return Err(ReshapeError::ambiguity(
                *column,
                format!(
                    "reads as wave {} concept '{}' or as wave {alt_wave} concept '{alt_concept}', \
                     and '{alt_concept}' is the concept of column '{other}'",
                    wave.wave,
                    wave.concept()
                ),
            ));
        }
    }
    Ok(())
}

/// Reject two columns resolving to the same `(prefix, wave, concept)`.
fn check_duplicate_triples(parsed: &[(&str, WaveColumn)]) -> Result<()> {
    let mut seen: BTreeMap<(String, u32, String), &str> = BTreeMap::new();
    for (column, wave) in parsed {
        let key = (wave.prefix.clone(), wave.wave, wave.concept());
        if let Some(previous) = seen.insert(key, *column) {
            return Err(ReshapeError::ambiguity(
                *column,
                format!(
                    "resolves to ({}, wave {}, '{}') like column '{previous}'",
                    wave.prefix,
                    wave.wave,
                    wave.concept()
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_model::PrefixConfig;

    fn config(max_wave: u32) -> ReshapeConfig {
        ReshapeConfig::new("hhidpn", max_wave)
            .with_prefix(PrefixConfig::new("r").with_invariant_prefix("ra"))
            .with_in_wave_prefix("inw")
            .with_sequential_years(1992, 2)
    }

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|column| column.to_string()).collect()
    }

    fn wave_of(classification: &Classification, column: &str) -> (u32, String, ParsePhase) {
        let wave = classification
            .tag(column)
            .and_then(ColumnTag::wave_column)
            .expect("wave-varying column");
        (wave.wave, wave.concept(), wave.phase)
    }

    #[test]
    fn splits_single_and_double_digit_waves() {
        let columns = names(&["hhidpn", "raracem", "r1shlt", "r9shlt", "r10shlt", "r12shlt"]);
        let classification = classify_columns(&columns, &config(12)).unwrap();

        assert_eq!(
            wave_of(&classification, "r1shlt"),
            (1, "shlt".to_string(), ParsePhase::SingleDigit)
        );
        assert_eq!(
            wave_of(&classification, "r12shlt"),
            (12, "shlt".to_string(), ParsePhase::DoubleDigit)
        );
        assert_eq!(
            classification.time_invariant_columns(),
            vec!["hhidpn", "raracem"]
        );
    }

    #[test]
    fn digit_run_above_max_wave_falls_back_to_single_digit() {
        let columns = names(&["hhidpn", "raracem", "r1shlt", "r15x"]);
        let classification = classify_columns(&columns, &config(14)).unwrap();

        assert_eq!(
            wave_of(&classification, "r15x"),
            (1, "5x".to_string(), ParsePhase::SingleDigit)
        );
        assert_eq!(classification.suspicious().len(), 1);
    }

    #[test]
    fn bare_in_wave_columns_have_empty_concept() {
        let columns = names(&["hhidpn", "raracem", "inw1", "inw11"]);
        let classification = classify_columns(&columns, &config(11)).unwrap();

        assert_eq!(
            wave_of(&classification, "inw1"),
            (1, String::new(), ParsePhase::SingleDigit)
        );
        assert_eq!(
            wave_of(&classification, "inw11"),
            (11, String::new(), ParsePhase::DoubleDigit)
        );
    }

    #[test]
    fn case_variants_of_one_triple_are_ambiguous() {
        let columns = names(&["hhidpn", "raracem", "r10shlt", "R10SHLT"]);
        let err = classify_columns(&columns, &config(10)).unwrap_err();
        assert!(matches!(err, ReshapeError::ClassificationAmbiguity { .. }));
    }

    #[test]
    fn plausible_single_digit_reading_is_ambiguous() {
        // r10x reads as wave 10 "x" or wave 1 "0x"; r20x (wave 2 "0x") makes the
        // second reading plausible.
        let columns = names(&["hhidpn", "raracem", "r10x", "r20x"]);
        let err = classify_columns(&columns, &config(14)).unwrap_err();
        match err {
            ReshapeError::ClassificationAmbiguity { column, .. } => assert_eq!(column, "r10x"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_column_is_a_configuration_error() {
        let columns = names(&["hhidpn", "raracem", "x1shlt"]);
        let err = classify_columns(&columns, &config(3)).unwrap_err();
        assert!(matches!(err, ReshapeError::Configuration { .. }));
    }

    #[test]
    fn overlapping_sub_prefixes_credit_longest_match() {
        let config = ReshapeConfig::new("id", 1)
            .with_prefix(
                PrefixConfig::new("h")
                    .with_invariant_prefix("ha")
                    .with_invariant_prefix("hac"),
            )
            .with_sequential_years(1992, 2);
        let columns = names(&["id", "hacohort", "hatotb", "h1itot"]);

        let classification = classify_columns(&columns, &config).unwrap();

        assert_eq!(
            classification.time_invariant_columns(),
            vec!["id", "hacohort", "hatotb"]
        );
        assert_eq!(
            wave_of(&classification, "h1itot"),
            (1, "itot".to_string(), ParsePhase::SingleDigit)
        );
    }

    #[test]
    fn unmatched_sub_prefix_is_a_configuration_error() {
        let columns = names(&["hhidpn", "r1shlt"]);
        let err = classify_columns(&columns, &config(3)).unwrap_err();
        match err {
            ReshapeError::Configuration { message } => assert!(message.contains("'ra'")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wave_beyond_max_wave_is_a_configuration_error() {
        let columns = names(&["hhidpn", "raracem", "r4shlt"]);
        let err = classify_columns(&columns, &config(3)).unwrap_err();
        assert!(matches!(err, ReshapeError::Configuration { .. }));
    }

    #[test]
    fn wave_zero_is_a_configuration_error() {
        let columns = names(&["hhidpn", "raracem", "r0shlt"]);
        let err = classify_columns(&columns, &config(3)).unwrap_err();
        assert!(matches!(err, ReshapeError::Configuration { .. }));
    }

    #[test]
    fn prefix_match_is_case_insensitive() {
        let columns = names(&["HHIDPN", "RARACEM", "R2SHLT"]);
        let classification = classify_columns(&columns, &config(3)).unwrap();
        assert_eq!(
            wave_of(&classification, "R2SHLT"),
            (2, "shlt".to_string(), ParsePhase::SingleDigit)
        );
        assert!(classification.tag("HHIDPN").unwrap().is_time_invariant());
    }
}
