//! Probe command handler.

use anyhow::Result;
use osrm_loader_runtime::{LoaderConfig, wait_for_ready};

use crate::error::CliError;

/// Wait until `host:port` accepts a connection or the timeout elapses.
pub async fn execute(config: &LoaderConfig) -> Result<()> {
    wait_for_ready(&config.host, config.port, config.timeout)
        .await
        .map_err(CliError::from)?;
    println!("osrm-routed is accepting connections on {}", config.address());
    Ok(())
}
