//! Load strategies.
//!
//! A strategy decides how a dataset is made available to osrm-routed and how
//! the server is launched:
//!
//! - [`DirectLoader`] - `direct` and `mmap`, server reads the files itself
//! - [`DatastoreLoader`] - `datastore`, data published to shared memory first
//!
//! Both build on [`ServerSlot`], which owns at most one server process.

mod datastore;
mod direct;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use osrm_loader_core::{Dataset, LoaderConfig, LoaderError, LoaderResult, StrategyKind};
use serde::Serialize;
use tracing::warn;

use crate::command::LaunchCommand;
use crate::process::{CrashMonitor, ProcessHandle, shutdown_within};
use crate::readiness::wait_for_ready;

pub use datastore::DatastoreLoader;
pub use direct::DirectLoader;

/// Snapshot of the server a strategy currently owns.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub strategy: StrategyKind,
    pub pid: Option<u32>,
    pub address: String,
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub log_file: PathBuf,
}

/// Capability shared by all load strategies.
///
/// Calls are serialized by the caller: each `load`/`shutdown` completes
/// before the next one is issued.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoadStrategy: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Make `dataset` available and bring the server up, logging to `log_file`.
    async fn load(&mut self, dataset: &Dataset, log_file: &Path) -> LoaderResult<()>;

    /// Stop the server owned by this strategy, if any.
    async fn shutdown(&mut self) -> LoaderResult<()>;

    /// Whether this strategy owns a live server.
    fn is_running(&self) -> bool;

    /// Details of the live server, if any.
    fn server(&self) -> Option<ServerInfo>;
}

/// At most one osrm-routed process plus the settings to start and stop it.
#[derive(Debug)]
pub(crate) struct ServerSlot {
    config: Arc<LoaderConfig>,
    crashes: CrashMonitor,
    child: Option<ProcessHandle>,
}

impl ServerSlot {
    pub(crate) const fn new(config: Arc<LoaderConfig>, crashes: CrashMonitor) -> Self {
        Self {
            config,
            crashes,
            child: None,
        }
    }

    pub(crate) fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub(crate) fn is_running(&self) -> bool {
        self.child.as_ref().is_some_and(ProcessHandle::is_running)
    }

    pub(crate) const fn child(&self) -> Option<&ProcessHandle> {
        self.child.as_ref()
    }

    /// Spawn the server. The caller checks liveness first.
    pub(crate) fn spawn(&mut self, launch: &LaunchCommand, log_file: &Path) -> LoaderResult<()> {
        let handle = ProcessHandle::spawn(launch, log_file, self.crashes.clone())?;
        self.child = Some(handle);
        Ok(())
    }

    /// Wait until the freshly spawned server accepts connections.
    ///
    /// A server that dies while being probed yields `ProcessCrashed`; one
    /// that never becomes reachable is killed before `ConnectionTimeout` is
    /// returned, so no live-process record is left behind.
    pub(crate) async fn wait_for_connection(&mut self) -> LoaderResult<()> {
        let Some(child) = self.child.as_ref() else {
            return Ok(());
        };

        let result = tokio::select! {
            ready = wait_for_ready(&self.config.host, self.config.port, self.config.timeout) => ready,
            report = child.exited() => Err(LoaderError::ProcessCrashed {
                command: child.command().to_string(),
                reason: report.reason(),
            }),
        };

        if let Err(ref e) = result
            && let Some(child) = self.child.take()
            && child.is_running()
        {
            warn!(pid = ?child.pid(), error = %e, "osrm-routed never became reachable, killing it");
            child.kill().await;
        }
        result
    }

    /// Stop the server within the configured timeout.
    ///
    /// The process record is dropped whatever the outcome: after a timeout
    /// the process has been killed.
    pub(crate) async fn shutdown(&mut self) -> LoaderResult<()> {
        let Some(child) = self.child.take() else {
            return Ok(());
        };
        shutdown_within(&child, self.config.timeout).await
    }

    pub(crate) fn info(&self, strategy: StrategyKind) -> Option<ServerInfo> {
        self.child
            .as_ref()
            .filter(|c| c.is_running())
            .map(|c| ServerInfo {
                strategy,
                pid: c.pid(),
                address: self.config.address(),
                command: c.command().to_string(),
                started_at: c.started_at(),
                log_file: c.log_file(),
            })
    }
}
