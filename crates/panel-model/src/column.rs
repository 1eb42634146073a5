//! Column classification types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which phase of the two-phase wave parse produced a wave-varying tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePhase {
    /// Digit run read greedily and found in `[10, max_wave]`.
    DoubleDigit,
    /// First digit only, wave in `[1, 9]`.
    SingleDigit,
}

/// Decomposition of a wave-varying column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveColumn {
    /// Configured prefix tag that owns the column.
    pub prefix: String,
    pub wave: u32,
    /// Concept as spelled in the column name (case preserved).
    pub raw_concept: String,
    pub phase: ParsePhase,
}

impl WaveColumn {
    /// Case-normalized concept used as the stub key.
    pub fn concept(&self) -> String {
        self.raw_concept.to_ascii_lowercase()
    }

    pub fn stub(&self) -> Stub {
        Stub::new(self.prefix.clone(), self.concept())
    }
}

/// Classification of a single wide-table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnTag {
    /// Subject key, reserved sub-prefix, or explicitly listed invariant column.
    TimeInvariant,
    WaveVarying(WaveColumn),
}

impl ColumnTag {
    pub fn is_time_invariant(&self) -> bool {
        matches!(self, Self::TimeInvariant)
    }

    pub fn wave_column(&self) -> Option<&WaveColumn> {
        match self {
            Self::TimeInvariant => None,
            Self::WaveVarying(column) => Some(column),
        }
    }
}

/// Canonical `(prefix, concept)` family of wave-varying columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stub {
    pub prefix: String,
    /// Lowercase concept; empty for the in-wave indicator.
    pub concept: String,
}

impl Stub {
    pub fn new(prefix: impl Into<String>, concept: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            concept: concept.into(),
        }
    }

    /// True for the reserved zero-concept stub.
    pub fn is_bare(&self) -> bool {
        self.concept.is_empty()
    }
}

impl fmt::Display for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.prefix, self.concept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_key_is_case_normalized() {
        let column = WaveColumn {
            prefix: "r".to_string(),
            wave: 10,
            raw_concept: "SHLT".to_string(),
            phase: ParsePhase::DoubleDigit,
        };
        assert_eq!(column.stub(), Stub::new("r", "shlt"));
    }

    #[test]
    fn tag_serializes_with_kind() {
        let tag = ColumnTag::TimeInvariant;
        let json = serde_json::to_string(&tag).expect("serialize tag");
        assert_eq!(json, r#"{"kind":"time_invariant"}"#);
    }
}
