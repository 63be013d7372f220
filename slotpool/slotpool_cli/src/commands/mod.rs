//! CLI subcommands

pub mod demo;
pub mod query;
pub mod status;
pub mod stress;
