//! Wide-to-long panel reshape engine.
//!
//! Converts a survey table with one row per subject and columns named
//! `prefix + wave + concept` into a long table with one row per
//! `(subject, wave)`. See [`reshape_wide`] for the entry point.

pub mod classify;
pub mod error;
pub mod frame;
pub mod join;
pub mod pipeline;
pub mod preflight;
pub mod reshape;
pub mod stubs;
pub mod subjects;
pub mod wave_year;

pub use classify::{Classification, classify_columns};
pub use error::{ReshapeError, Result};
pub use frame::PrefixFrame;
pub use join::{join_long, verify_time_invariants};
pub use pipeline::{ReshapeOutput, classify_wide, reshape_wide};
pub use preflight::{apply_renames, resolve_subject_column};
pub use reshape::reshape_prefix;
pub use stubs::{NamingInconsistency, StubEntry, StubTable, build_stub_table};
pub use subjects::SubjectIndex;
pub use wave_year::apply_wave_years;
