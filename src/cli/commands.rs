//! CLI commands and argument parsing

use crate::taps::TapKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Singer taps for Datadog logs and XTM project metadata
#[derive(Parser, Debug)]
#[command(name = "singer-taps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Tap to run
    #[arg(short, long)]
    pub tap: TapKind,

    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// State file (JSON) from a previous run
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Catalog file (JSON); defaults to the discovered catalog
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print the catalog of available streams
    Discover,

    /// Sync selected streams to stdout
    Sync {
        /// Streams to sync (comma-separated, empty = all selected)
        #[arg(long, value_delimiter = ',')]
        streams: Vec<String>,

        /// Maximum records per stream
        #[arg(long)]
        max_records: Option<usize>,
    },

    /// Test the credentials against the API
    Check,

    /// List stream names
    Streams,
}
