//! `direct` and `mmap` strategies: osrm-routed reads the dataset itself.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use osrm_loader_core::{Dataset, LoaderConfig, LoaderError, LoaderResult, StrategyKind};
use tracing::info;

use super::{LoadStrategy, ServerInfo, ServerSlot};
use crate::command;
use crate::process::CrashMonitor;

/// Launches osrm-routed against the `.osrm` files, copied into memory
/// (`direct`) or memory-mapped (`mmap`).
#[derive(Debug)]
pub struct DirectLoader {
    kind: StrategyKind,
    slot: ServerSlot,
    dataset: Option<Dataset>,
}

impl DirectLoader {
    /// Strategy loading the dataset into process memory.
    pub const fn new(config: Arc<LoaderConfig>, crashes: CrashMonitor) -> Self {
        Self {
            kind: StrategyKind::Direct,
            slot: ServerSlot::new(config, crashes),
            dataset: None,
        }
    }

    /// Strategy memory-mapping the dataset.
    pub const fn mmap(config: Arc<LoaderConfig>, crashes: CrashMonitor) -> Self {
        Self {
            kind: StrategyKind::Mmap,
            slot: ServerSlot::new(config, crashes),
            dataset: None,
        }
    }

    /// Dataset of the current (or last) `load`.
    pub const fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    fn up(&mut self, dataset: &Dataset, log_file: &Path) -> LoaderResult<()> {
        if self.slot.is_running() {
            return Err(LoaderError::AlreadyRunning);
        }

        let launch = command::routed_from_file(
            self.slot.config(),
            dataset,
            self.kind == StrategyKind::Mmap,
        );
        self.slot.spawn(&launch, log_file)
    }
}

#[async_trait]
impl LoadStrategy for DirectLoader {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn load(&mut self, dataset: &Dataset, log_file: &Path) -> LoaderResult<()> {
        self.dataset = Some(dataset.clone());

        // Always restart, even if this strategy was not the active one
        self.slot.shutdown().await?;
        self.up(dataset, log_file)?;
        self.slot.wait_for_connection().await?;

        info!(strategy = %self.kind, input = %dataset.input_file.display(), "Dataset loaded");
        Ok(())
    }

    async fn shutdown(&mut self) -> LoaderResult<()> {
        self.slot.shutdown().await
    }

    fn is_running(&self) -> bool {
        self.slot.is_running()
    }

    fn server(&self) -> Option<ServerInfo> {
        self.slot.info(self.kind)
    }
}
