//! Subject identity.

use std::collections::HashMap;

use panel_ingest::{any_to_string, is_missing};
use polars::prelude::*;

use crate::error::{ReshapeError, Result};

/// Subjects in input row order, keyed by the string form of their ID.
#[derive(Debug, Clone)]
pub struct SubjectIndex {
    column: String,
    keys: Vec<String>,
    positions: HashMap<String, usize>,
}

impl SubjectIndex {
    /// Index the subject key column of a wide table.
    ///
    /// A null or repeated key would produce duplicate `(subject, wave)` rows,
    /// so both are rejected.
    pub fn from_frame(df: &DataFrame, column: &str) -> Result<Self> {
        let key_column = df.column(column)?;
        let mut keys = Vec::with_capacity(df.height());
        let mut positions = HashMap::with_capacity(df.height());
        for row in 0..df.height() {
            let value = key_column.get(row)?;
            if is_missing(&value) {
                return Err(ReshapeError::shape(format!(
                    "subject key '{column}' is missing on input row {}",
                    row + 1
                )));
            }
            let key = any_to_string(value);
            if let Some(first) = positions.insert(key.clone(), row) {
                return Err(ReshapeError::shape(format!(
                    "subject '{key}' appears on input rows {} and {}",
                    first + 1,
                    row + 1
                )));
            }
            keys.push(key);
        }
        Ok(Self {
            column: column.to_string(),
            keys,
            positions,
        })
    }

    /// Name of the subject key column.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Input row of a subject.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }
}
