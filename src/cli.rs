//! Command-line interface for strictly_crm.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly CRM - data-entry training game
#[derive(Parser, Debug)]
#[command(name = "strictly_crm")]
#[command(about = "Data-entry training game with scored CRM forms", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play the drill in the terminal
    Play {
        /// Stage catalog (TOML); defaults to the built-in stages
        #[arg(short, long)]
        stages: Option<PathBuf>,

        /// Drill configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the result display delay in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// List the stages of a catalog
    Stages {
        /// Stage catalog (TOML); defaults to the built-in stages
        #[arg(short, long)]
        stages: Option<PathBuf>,

        /// Print the stage definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a stage catalog file
    Check {
        /// Catalog file to check
        file: PathBuf,
    },
}
