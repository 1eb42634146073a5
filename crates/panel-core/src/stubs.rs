//! Stub table: one entry per `(prefix, concept)` family.

use std::collections::{BTreeMap, BTreeSet};

use panel_model::{ParsePhase, Stub};
use tracing::{debug, warn};

use crate::classify::Classification;

/// Observed coverage of a single stub.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubEntry {
    /// Source column for every wave at which the stub was observed.
    pub waves: BTreeMap<u32, String>,
    /// Parse phases that contributed columns.
    pub phases: BTreeSet<ParsePhase>,
    /// Concept spellings as they appeared in column names.
    pub spellings: BTreeSet<String>,
}

impl StubEntry {
    pub fn observed_waves(&self) -> Vec<u32> {
        self.waves.keys().copied().collect()
    }

    pub fn source_column(&self, wave: u32) -> Option<&str> {
        self.waves.get(&wave).map(String::as_str)
    }
}

/// A naming disagreement between columns of one stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingInconsistency {
    /// The same concept is spelled with different letter case across waves.
    MixedCase {
        stub: Stub,
        spellings: Vec<String>,
    },
    /// The stub occurs only in one encoding era of a prefix that has both.
    EraLimited { stub: Stub, phase: ParsePhase },
}

impl NamingInconsistency {
    pub fn message(&self) -> String {
        match self {
            Self::MixedCase { stub, spellings } => format!(
                "stub {stub} is spelled {} across waves",
                spellings.join(" / ")
            ),
            Self::EraLimited { stub, phase } => {
                let era = match phase {
                    ParsePhase::SingleDigit => "waves 1-9",
                    ParsePhase::DoubleDigit => "waves 10+",
                };
                format!("stub {stub} only occurs in {era}")
            }
        }
    }

    /// Mixed spellings are worth an operator's attention; era limits are routine.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MixedCase { .. })
    }
}

/// Deduplicated stubs with their observed waves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubTable {
    stubs: BTreeMap<Stub, StubEntry>,
    inconsistencies: Vec<NamingInconsistency>,
}

impl StubTable {
    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    pub fn get(&self, stub: &Stub) -> Option<&StubEntry> {
        self.stubs.get(stub)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Stub, &StubEntry)> {
        self.stubs.iter()
    }

    /// Stubs of one prefix, ordered by concept.
    pub fn for_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a Stub, &'a StubEntry)> {
        self.stubs
            .iter()
            .filter(move |(stub, _)| stub.prefix == prefix)
    }

    /// Union of waves touched by any stub of the prefix.
    pub fn waves_for_prefix(&self, prefix: &str) -> BTreeSet<u32> {
        self.for_prefix(prefix)
            .flat_map(|(_, entry)| entry.waves.keys().copied())
            .collect()
    }

    pub fn inconsistencies(&self) -> &[NamingInconsistency] {
        &self.inconsistencies
    }
}

/// Union the stubs discovered by both parse phases.
///
/// The result depends only on the set of classified columns, not their order.
/// Triple uniqueness is guaranteed by [`classify_columns`](crate::classify_columns).
pub fn build_stub_table(classification: &Classification) -> StubTable {
    let mut stubs: BTreeMap<Stub, StubEntry> = BTreeMap::new();
    for (column, wave) in classification.wave_columns() {
        let entry = stubs.entry(wave.stub()).or_default();
        entry.waves.insert(wave.wave, column.to_string());
        entry.phases.insert(wave.phase);
        entry.spellings.insert(wave.raw_concept.clone());
    }

    let mut phases_by_prefix: BTreeMap<&str, BTreeSet<ParsePhase>> = BTreeMap::new();
    for (stub, entry) in &stubs {
        phases_by_prefix
            .entry(stub.prefix.as_str())
            .or_default()
            .extend(entry.phases.iter().copied());
    }

    let mut inconsistencies = Vec::new();
    for (stub, entry) in &stubs {
        if entry.spellings.len() > 1 {
            let spellings: Vec<String> = entry.spellings.iter().cloned().collect();
            warn!(stub = %stub, spellings = ?spellings, "naming inconsistency across waves");
            inconsistencies.push(NamingInconsistency::MixedCase {
                stub: stub.clone(),
                spellings,
            });
        }
        let prefix_has_both = phases_by_prefix
            .get(stub.prefix.as_str())
            .is_some_and(|phases| phases.len() > 1);
        if prefix_has_both
            && entry.phases.len() == 1
            && let Some(phase) = entry.phases.iter().next().copied()
        {
            debug!(stub = %stub, phase = ?phase, "stub confined to one encoding era");
            inconsistencies.push(NamingInconsistency::EraLimited {
                stub: stub.clone(),
                phase,
            });
        }
    }

    StubTable {
        stubs,
        inconsistencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_columns;
    use panel_model::{PrefixConfig, ReshapeConfig};

    fn classify(columns: &[&str]) -> Classification {
        let config = ReshapeConfig::new("id", 12)
            .with_prefix(PrefixConfig::new("r"))
            .with_prefix(PrefixConfig::new("s"))
            .with_sequential_years(1992, 2);
        let columns: Vec<String> = columns.iter().map(|column| column.to_string()).collect();
        classify_columns(&columns, &config).expect("classify")
    }

    #[test]
    fn unions_single_and_double_digit_waves() {
        let table = build_stub_table(&classify(&["id", "r1shlt", "r3shlt", "r11shlt", "s2shlt"]));

        let entry = table.get(&Stub::new("r", "shlt")).expect("r shlt stub");
        assert_eq!(entry.observed_waves(), vec![1, 3, 11]);
        assert_eq!(entry.source_column(11), Some("r11shlt"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.waves_for_prefix("s").into_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn mixed_case_is_reported_not_fatal() {
        let table = build_stub_table(&classify(&["id", "r1shlt", "r10SHLT"]));

        assert_eq!(table.len(), 1);
        let warnings: Vec<_> = table
            .inconsistencies()
            .iter()
            .filter(|item| item.is_warning())
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message().contains("SHLT / shlt"));
    }

    #[test]
    fn era_limited_stubs_are_recorded() {
        let table = build_stub_table(&classify(&["id", "r1shlt", "r10shlt", "r11cesd"]));

        assert!(table.inconsistencies().contains(&NamingInconsistency::EraLimited {
            stub: Stub::new("r", "cesd"),
            phase: ParsePhase::DoubleDigit,
        }));
    }

    #[test]
    fn independent_of_column_order() {
        let forward = build_stub_table(&classify(&["id", "r1shlt", "r10shlt", "s2cesd"]));
        let reverse = build_stub_table(&classify(&["s2cesd", "r10shlt", "r1shlt", "id"]));
        assert_eq!(forward, reverse);
    }
}
