//! Main CLI parser and top-level argument handling.
//!
//! Global options override the `OSRM_*` environment configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the OSRM loader.
#[derive(Debug, Parser)]
#[command(name = "osrm-loader")]
#[command(about = "Start, switch and stop osrm-routed for integration tests")]
#[command(version)]
pub struct Cli {
    /// Address osrm-routed binds to and is probed on
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port osrm-routed binds to and is probed on
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Routing algorithm passed as `-a`
    #[arg(short, long, global = true)]
    pub algorithm: Option<String>,

    /// Shared-memory dataset name used by the datastore strategy
    #[arg(long = "dataset-name", global = true)]
    pub dataset_name: Option<String>,

    /// Timeout for readiness and shutdown, in milliseconds
    #[arg(long = "timeout-ms", global = true)]
    pub timeout_ms: Option<u64>,

    /// Directory holding osrm-routed and osrm-datastore
    #[arg(long = "bin-dir", global = true)]
    pub bin_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "osrm-loader",
            "--port",
            "5001",
            "--timeout-ms",
            "200",
            "probe",
            "--verbose",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.port, Some(5001));
        assert_eq!(cli.timeout_ms, Some(200));
        assert!(matches!(cli.command, Commands::Probe));
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::parse_from([
            "osrm-loader",
            "run",
            "--dataset",
            "a.osrm",
            "--dataset",
            "b.osrm",
            "--strategy",
            "mmap",
            "--loader-args=--only-metric --foo",
            "--hold-ms",
            "100",
        ]);
        let Commands::Run {
            datasets,
            strategy,
            loader_args,
            hold_ms,
            log,
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(datasets, vec![PathBuf::from("a.osrm"), PathBuf::from("b.osrm")]);
        assert_eq!(strategy.as_deref(), Some("mmap"));
        assert_eq!(loader_args, vec!["--only-metric", "--foo"]);
        assert_eq!(hold_ms, Some(100));
        assert!(log.is_none());
    }

    #[test]
    fn test_run_requires_dataset() {
        assert!(Cli::try_parse_from(["osrm-loader", "run"]).is_err());
    }
}
