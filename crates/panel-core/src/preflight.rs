//! Checks that the configuration fits the actual wide table, and renames.

use std::collections::BTreeSet;

use panel_model::ReshapeConfig;
use polars::prelude::*;
use tracing::debug;

use crate::error::{ReshapeError, Result};

/// Locate the subject key column, matching case-insensitively.
pub fn resolve_subject_column(df: &DataFrame, config: &ReshapeConfig) -> Result<String> {
    df.get_column_names()
        .into_iter()
        .find(|name| name.eq_ignore_ascii_case(&config.subject_key))
        .map(|name| name.to_string())
        .ok_or_else(|| {
            ReshapeError::configuration(format!(
                "subject key '{}' is not a column of the input",
                config.subject_key
            ))
        })
}

/// Apply the configured renames.
///
/// Every rename source must exist and no target may collide with a column
/// that remains after renaming.
pub fn apply_renames(df: &DataFrame, config: &ReshapeConfig) -> Result<DataFrame> {
    if config.renames.is_empty() {
        return Ok(df.clone());
    }

    let mut names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    for rename in &config.renames {
        let Some(slot) = names.iter_mut().find(|name| **name == rename.from) else {
            return Err(ReshapeError::configuration(format!(
                "rename source '{}' is not a column of the input",
                rename.from
            )));
        };
        *slot = rename.to.clone();
    }

    let mut seen = BTreeSet::new();
    for name in &names {
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(ReshapeError::configuration(format!(
                "rename target '{name}' collides with an existing column"
            )));
        }
    }

    let mut renamed = df.clone();
    renamed.set_column_names(names.iter().map(String::as_str))?;
    debug!(renames = config.renames.len(), "columns renamed");
    Ok(renamed)
}
