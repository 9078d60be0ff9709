//! Imagemill - cached image derivatives for blog media.

#![allow(dead_code)]

mod cache;
mod cli;
mod config;
mod filterset;
mod intake;
mod logger;
mod transform;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::AppConfig;
use filterset::init_registry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = AppConfig::load(&cli)?;

    // Filter sets are process-wide, read-mostly state: registered once
    // here, never mutated during request handling.
    init_registry(config.filters.clone());

    match &cli.command {
        Commands::Ingest { files } => cli::ingest::run(files, &config),
        Commands::Resolve {
            image,
            filter,
            json,
        } => cli::resolve::run(image, filter, *json, &config),
        Commands::Build { clean } => cli::build::run(*clean, &config),
        Commands::Filters { json } => cli::filters::run(*json),
    }
}
