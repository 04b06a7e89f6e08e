//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Query and download occupant behavior data from the OB database.
///
/// Lists the behaviors the database offers, shows which behaviors each study
/// contains, and downloads ZIP exports for a selection of behaviors and studies.
#[derive(Parser, Debug)]
#[command(name = "obplatform")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// API endpoint (overrides OBPLATFORM_ENDPOINT and the config file)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Config file to read instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all behaviors available in the database (JSON)
    Behaviors,

    /// List the behaviors available in each study (JSON)
    Studies {
        /// Study identifiers
        #[arg(required = true)]
        studies: Vec<String>,
    },

    /// Check that the service is reachable and healthy
    Health,

    /// Download the data archive (ZIP) for behaviors x studies
    Export(ExportArgs),

    /// Show the effective configuration
    Config,
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct ExportArgs {
    /// Behavior identifiers, e.g. Appliance_Usage (repeat or comma-separate)
    #[arg(short, long = "behavior", value_delimiter = ',', required = true)]
    pub behaviors: Vec<String>,

    /// Study identifiers (repeat or comma-separate)
    #[arg(short, long = "study", value_delimiter = ',', required = true)]
    pub studies: Vec<String>,

    /// Output archive path
    #[arg(short, long, default_value = "data.zip")]
    pub output: PathBuf,

    /// Show a download progress bar
    #[arg(short, long)]
    pub progress: bool,

    /// Write buffer size in bytes
    #[arg(long, default_value_t = obplatform::DEFAULT_CHUNK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..=(64 * 1024 * 1024)))]
    pub chunk_size: u64,
}
