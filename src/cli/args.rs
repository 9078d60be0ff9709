//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Imagemill media derivative CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: imagemill.toml, searched upward)
    #[arg(short = 'C', long, default_value = "imagemill.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Validate files and store them in the media library
    #[command(visible_alias = "i")]
    Ingest {
        /// Files to admit
        #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
        files: Vec<PathBuf>,
    },

    /// Resolve a (image, filter set) pair to its cached derivative
    #[command(visible_alias = "r")]
    Resolve {
        /// Admitted media name (as printed by ingest)
        image: String,

        /// Filter set name
        filter: String,

        /// Print a JSON record instead of the bare path
        #[arg(long)]
        json: bool,
    },

    /// Precompute every filter set for every admitted image
    #[command(visible_alias = "b")]
    Build {
        /// Drop the existing cache and rebuild everything
        #[arg(short, long)]
        clean: bool,
    },

    /// List registered filter sets
    #[command(visible_alias = "f")]
    Filters {
        /// Print full definitions as JSON
        #[arg(long)]
        json: bool,
    },
}
