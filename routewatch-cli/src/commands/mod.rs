//! CLI subcommand implementations.

pub mod analytics;
pub mod run;
