//! `datastore` strategy: publish into shared memory, attach a long-lived server.
//!
//! Swapping datasets only re-runs `osrm-datastore`; the network listener
//! keeps running and picks up the newly published segment.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use osrm_loader_core::{Dataset, LoaderConfig, LoaderError, LoaderResult, StrategyKind};
use tracing::{debug, info};

use super::{LoadStrategy, ServerInfo, ServerSlot};
use crate::command;
use crate::process::{CrashMonitor, append_to_file};

/// Two-phase loader: `osrm-datastore` (prepare) then `osrm-routed -s` (up).
#[derive(Debug)]
pub struct DatastoreLoader {
    slot: ServerSlot,
    dataset: Option<Dataset>,
}

impl DatastoreLoader {
    pub const fn new(config: Arc<LoaderConfig>, crashes: CrashMonitor) -> Self {
        Self {
            slot: ServerSlot::new(config, crashes),
            dataset: None,
        }
    }

    /// Dataset of the current (or last) `load`.
    pub const fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Publish `dataset` into the configured shared-memory segment.
    ///
    /// The tool's output is appended to the scenario log either way.
    async fn prepare(&self, dataset: &Dataset, log_file: &Path) -> LoaderResult<()> {
        let launch = command::datastore(self.slot.config(), dataset);
        info!(command = %launch, "Publishing dataset to shared memory");

        let output = launch.output().await?;
        append_to_file(log_file, &output.stdout)?;
        append_to_file(log_file, &output.stderr)?;

        if !output.status.success() {
            let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
            captured.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(LoaderError::PrepareFailed {
                code: output.status.code(),
                output: captured.trim_end().to_string(),
            });
        }

        debug!(dataset_name = %self.slot.config().dataset_name, "Dataset published");
        Ok(())
    }

    /// Spawn the shared-memory server unless one is already live.
    ///
    /// Returns right after spawning; returns `false` when nothing was spawned.
    fn up(&mut self, log_file: &Path) -> LoaderResult<bool> {
        if self.slot.is_running() {
            return Ok(false);
        }

        let launch = command::routed_shared_memory(self.slot.config());
        self.slot.spawn(&launch, log_file)?;
        Ok(true)
    }
}

#[async_trait]
impl LoadStrategy for DatastoreLoader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Datastore
    }

    async fn load(&mut self, dataset: &Dataset, log_file: &Path) -> LoaderResult<()> {
        self.dataset = Some(dataset.clone());

        self.prepare(dataset, log_file).await?;

        if self.up(log_file)? {
            self.slot.wait_for_connection().await?;
        } else if let Some(child) = self.slot.child() {
            // Reused server: keep per-scenario logs attributable
            child.redirect_output(log_file)?;
            info!(pid = ?child.pid(), "Reusing running osrm-routed");
        }

        info!(input = %dataset.input_file.display(), "Dataset loaded");
        Ok(())
    }

    async fn shutdown(&mut self) -> LoaderResult<()> {
        self.slot.shutdown().await
    }

    fn is_running(&self) -> bool {
        self.slot.is_running()
    }

    fn server(&self) -> Option<ServerInfo> {
        self.slot.info(StrategyKind::Datastore)
    }
}
