//! Command-line interface: argument definitions and subcommand runners.

pub mod args;
pub mod build;
pub mod filters;
pub mod ingest;
pub mod resolve;

pub use args::{Cli, Commands};
