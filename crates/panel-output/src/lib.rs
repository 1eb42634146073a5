//! Persistence for reshaped panel tables and run reports.
//!
//! Every write goes to a temp file that is renamed into place, so a failed
//! run never leaves a partial output behind.

pub mod atomic;
pub mod error;
pub mod hash;
pub mod writer;

pub use atomic::{StagedFile, commit_all, stage_atomic, temp_path_for, write_atomic};
pub use error::{OutputError, Result};
pub use hash::compute_file_hash;
pub use writer::{stage_long_csv, stage_report_json, write_long_csv, write_report_json};
