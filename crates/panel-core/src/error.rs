//! Error types for the reshape engine.

use panel_model::ConfigError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Fatal reshape errors. Any of these aborts the run before output is written.
#[derive(Debug, Error)]
pub enum ReshapeError {
    /// The configuration contradicts itself.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The configuration contradicts the actual column set.
    #[error("configuration does not match the input: {message}")]
    Configuration { message: String },

    /// A column admits more than one parse, or two columns share one.
    #[error("ambiguous column '{column}': {reason}")]
    ClassificationAmbiguity { column: String, reason: String },

    /// A structural invariant of the long table failed.
    #[error("shape invariant violated: {message}")]
    ShapeInvariantViolation { message: String },

    #[error("DataFrame operation failed: {0}")]
    Polars(#[from] PolarsError),
}

impl ReshapeError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::ShapeInvariantViolation {
            message: message.into(),
        }
    }

    pub(crate) fn ambiguity(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ClassificationAmbiguity {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Broad category used in logs and the CLI exit message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) | Self::Configuration { .. } => "ConfigurationError",
            Self::ClassificationAmbiguity { .. } => "ClassificationAmbiguity",
            Self::ShapeInvariantViolation { .. } => "ShapeInvariantViolation",
            Self::Polars(_) => "DataFrameError",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReshapeError>;
