use thiserror::Error;

/// Errors raised when a [`ReshapeConfig`](crate::ReshapeConfig) is internally inconsistent.
///
/// These are detected before any column is looked at. Inconsistencies between
/// the configuration and an actual column set are reported by the engine.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("subject key must not be empty")]
    EmptySubjectKey,

    #[error("at least one entity prefix must be configured")]
    NoPrefixes,

    #[error("entity prefix must not be empty")]
    EmptyPrefix,

    #[error("entity prefix '{tag}' must not end with a digit")]
    PrefixEndsWithDigit { tag: String },

    #[error("entity prefix '{tag}' is configured more than once")]
    DuplicatePrefix { tag: String },

    #[error("invariant sub-prefix '{sub_prefix}' does not start with its entity prefix '{tag}'")]
    InvariantOutsidePrefix { tag: String, sub_prefix: String },

    #[error("in-wave prefix '{tag}' is not a configured entity prefix")]
    UnknownInWavePrefix { tag: String },

    #[error("max_wave must be between 1 and 99, got {max_wave}")]
    MaxWaveOutOfRange { max_wave: u32 },

    #[error("wave-year table has no entry for wave {wave}")]
    MissingWaveYear { wave: u32 },

    #[error("wave-year table maps wave {wave}, which is outside 1..={max_wave}")]
    ExtraWaveYear { wave: u32, max_wave: u32 },

    #[error("rename of '{from}' is configured more than once")]
    DuplicateRename { from: String },

    #[error("range check on '{column}' has min {min} greater than max {max}")]
    InvertedRange { column: String, min: f64, max: f64 },

    #[error("unknown preset '{name}'")]
    UnknownPreset { name: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
