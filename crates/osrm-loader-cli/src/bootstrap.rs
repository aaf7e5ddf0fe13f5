//! Composition root: resolve the loader configuration.

use std::time::Duration;

use osrm_loader_runtime::{ConfigError, LoaderConfig};

use crate::parser::Cli;

/// Read `OSRM_*` from the environment, then apply command-line overrides.
pub fn build_config(cli: &Cli) -> Result<LoaderConfig, ConfigError> {
    apply_overrides(LoaderConfig::from_env()?, cli)
}

fn apply_overrides(mut config: LoaderConfig, cli: &Cli) -> Result<LoaderConfig, ConfigError> {
    if let Some(host) = &cli.host {
        if host.trim().is_empty() {
            return Err(ConfigError::Empty("--host".to_string()));
        }
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(algorithm) = &cli.algorithm {
        config.algorithm.clone_from(algorithm);
    }
    if let Some(name) = &cli.dataset_name {
        config.dataset_name.clone_from(name);
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout = Duration::from_millis(ms);
    }
    if let Some(dir) = &cli.bin_dir {
        config.bin_dir = Some(dir.clone());
    }
    Ok(config)
}
