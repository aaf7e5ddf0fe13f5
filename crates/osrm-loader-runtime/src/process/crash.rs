//! Run-wide record of unexpected server exits.
//!
//! An unexpected exit of the managed server is fatal for the whole test run.
//! Instead of aborting the harness from inside the exit watcher, the crash is
//! recorded here: every later `load`/`shutdown` fails with it and
//! [`CrashMonitor::halted`] resolves so the harness can stop.

use std::sync::{Arc, Mutex, PoisonError};

use osrm_loader_core::{LoaderError, LoaderResult};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Details of the first unexpected exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashReport {
    /// Command line of the crashed process.
    pub command: String,
    /// Exit reason, e.g. `exited with code 1`.
    pub reason: String,
}

impl CrashReport {
    /// Convert into the `ProcessCrashed` error.
    pub fn to_error(&self) -> LoaderError {
        LoaderError::ProcessCrashed {
            command: self.command.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Shared crash channel; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CrashMonitor {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    first: Mutex<Option<CrashReport>>,
    halted: CancellationToken,
}

impl CrashMonitor {
    /// Create a monitor with no crash recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an unexpected exit. Only the first crash is kept.
    pub fn report(&self, command: impl Into<String>, reason: impl Into<String>) {
        let report = CrashReport {
            command: command.into(),
            reason: reason.into(),
        };
        {
            let mut first = self
                .inner
                .first
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if first.is_some() {
                return;
            }
            error!(command = %report.command, reason = %report.reason, "osrm-routed exited unexpectedly, halting run");
            *first = Some(report);
        }
        self.inner.halted.cancel();
    }

    /// The recorded crash, if any.
    pub fn crash(&self) -> Option<CrashReport> {
        self.inner
            .first
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `Err(ProcessCrashed)` once a crash has been recorded.
    pub fn check(&self) -> LoaderResult<()> {
        self.crash().map_or(Ok(()), |report| Err(report.to_error()))
    }

    /// Whether a crash has been recorded.
    pub fn is_halted(&self) -> bool {
        self.inner.halted.is_cancelled()
    }

    /// Resolve with the `ProcessCrashed` error once a crash is recorded.
    pub async fn halted(&self) -> LoaderError {
        self.inner.halted.cancelled().await;
        self.crash().map_or_else(
            || LoaderError::ProcessCrashed {
                command: "osrm-routed".to_string(),
                reason: "exited unexpectedly".to_string(),
            },
            |report| report.to_error(),
        )
    }
}
