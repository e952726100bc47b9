//! CLI subcommand implementations.

pub mod constituents;
pub mod download;
pub mod financials;
pub mod screen;
pub mod search;
pub mod update;
