//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run tracker.
///
/// Extracts run summaries from FIT activity files recorded by sports
/// watches and bike computers.
#[derive(Debug, Parser)]
#[command(name = "rt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract and print the run summary of an activity file.
    Summary {
        /// Path to the FIT file.
        file: PathBuf,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show message counts for an activity file.
    Inspect {
        /// Path to the FIT file.
        file: PathBuf,
    },
}
