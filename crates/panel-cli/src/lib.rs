//! CLI library components for the panel reshape engine.

pub mod logging;
pub mod pipeline;
pub mod types;
