//! Run command handler.
//!
//! Loads every dataset in turn through the façade, prints the server status
//! after each load and then holds the server until Ctrl-C, the hold time or
//! a crash.

use std::future::pending;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use osrm_loader_runtime::{Dataset, LoaderConfig, LoaderFacade};
use tracing::{info, warn};

use crate::error::CliError;

/// Arguments of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub datasets: Vec<PathBuf>,
    pub strategy: Option<String>,
    pub log: Option<PathBuf>,
    pub loader_args: Vec<String>,
    pub hold: Option<Duration>,
}

/// Execute the run command.
pub async fn execute(config: LoaderConfig, args: RunArgs) -> Result<()> {
    let mut loader = LoaderFacade::new(config);
    if let Some(strategy) = args.strategy {
        loader.set_strategy(strategy);
    }
    if let Some(log) = args.log {
        loader.set_log_file(log);
    }

    for input in &args.datasets {
        let dataset = Dataset::new(input).with_loader_args(args.loader_args.iter().cloned());
        if let Err(e) = loader.load(&dataset).await {
            // Leave nothing running behind a failed load
            if let Err(shutdown) = loader.shutdown().await {
                warn!(error = %shutdown, "Shutdown after failed load failed");
            }
            return Err(CliError::from(e).into());
        }

        if let Some(info) = loader.server_info() {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    let hold = async {
        match args.hold {
            Some(duration) => tokio::time::sleep(duration).await,
            None => pending().await,
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(CliError::from)?;
            info!("Interrupted, shutting down");
        }
        () = hold => info!("Hold time elapsed, shutting down"),
        crash = loader.halted() => return Err(CliError::from(crash).into()),
    }

    loader.shutdown().await.map_err(CliError::from)?;
    Ok(())
}
