//! Subcommands of `osrm-loader`.

use std::path::PathBuf;

use clap::Subcommand;

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load one or more datasets and keep osrm-routed running
    Run {
        /// Input `.osrm` file; repeat to load several datasets in turn
        #[arg(short, long = "dataset", required = true)]
        datasets: Vec<PathBuf>,

        /// Load strategy: direct, mmap or datastore (default from OSRM_LOAD_METHOD)
        #[arg(short, long)]
        strategy: Option<String>,

        /// File receiving the output of the OSRM tools
        #[arg(long)]
        log: Option<PathBuf>,

        /// Extra arguments for the loader tool, space separated
        #[arg(long = "loader-args", value_delimiter = ' ', allow_hyphen_values = true)]
        loader_args: Vec<String>,

        /// Shut down after this many milliseconds instead of waiting for Ctrl-C
        #[arg(long = "hold-ms")]
        hold_ms: Option<u64>,
    },

    /// Check whether osrm-routed accepts connections
    Probe,
}
