//! A single supervised child process.
//!
//! The `Child` is owned by a background watcher task which reaps it and
//! fires the exit signal exactly once. The handle talks to the watcher
//! through a cancellation token (exit) and a channel (force kill).

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use osrm_loader_core::{LoaderError, LoaderResult};
use serde::Serialize;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::crash::CrashMonitor;
use super::output::{OutputLog, spawn_stream_reader};
use super::shutdown;
use crate::command::LaunchCommand;

#[cfg(unix)]
const SIGINT: i32 = nix::sys::signal::Signal::SIGINT as i32;
#[cfg(not(unix))]
const SIGINT: i32 = 2;

/// How a supervised process ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExitReport {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal, if any (Unix only).
    pub signal: Option<i32>,
    /// True when the exit followed a termination request from the handle.
    pub requested: bool,
    /// Set when the process could not be waited on.
    pub error: Option<String>,
}

impl ExitReport {
    fn from_status(status: ExitStatus, requested: bool) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
            requested,
            error: None,
        }
    }

    /// Whether the exit is expected: requested by the handle, interrupted
    /// with SIGINT, or a successful exit. Anything else is a crash.
    pub const fn is_clean(&self) -> bool {
        self.requested
            || matches!(self.code, Some(0))
            || matches!(self.signal, Some(SIGINT))
    }

    /// Human-readable exit reason.
    pub fn reason(&self) -> String {
        match (self.code, self.signal, &self.error) {
            (_, _, Some(e)) => format!("could not be waited on: {e}"),
            (Some(code), _, _) => format!("exited with code {code}"),
            (None, Some(signal), _) => format!("killed by signal {signal}"),
            (None, None, None) => "exited for an unknown reason".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct ExitState {
    exited: CancellationToken,
    report: Mutex<Option<ExitReport>>,
    terminating: AtomicBool,
}

/// Handle to one spawned process.
///
/// Dropping a handle whose process is still running kills the process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    command: String,
    started_at: DateTime<Utc>,
    output: Arc<OutputLog>,
    state: Arc<ExitState>,
    kill_tx: mpsc::UnboundedSender<()>,
}

impl ProcessHandle {
    /// Spawn `launch`, forwarding its output into `log_file`.
    ///
    /// An exit that was not requested through [`terminate`](Self::terminate)
    /// or [`kill`](Self::kill) is reported to `crashes`.
    pub fn spawn(
        launch: &LaunchCommand,
        log_file: &Path,
        crashes: CrashMonitor,
    ) -> LoaderResult<Self> {
        let output = Arc::new(OutputLog::open(log_file)?);
        let command = launch.to_string();

        let mut cmd = Command::new(&launch.program);
        cmd.args(&launch.args)
            .envs(launch.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Reaps the child if the watcher task is dropped with the runtime
            .kill_on_drop(true);

        // Own process group: a terminal Ctrl-C reaches the caller, not the server
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| LoaderError::Spawn {
            command: command.clone(),
            source,
        })?;
        let pid = child.id();

        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(stdout, pid, "stdout", Arc::clone(&output));
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(stderr, pid, "stderr", Arc::clone(&output));
        }

        let state = Arc::new(ExitState::default());
        let (kill_tx, kill_rx) = mpsc::unbounded_channel();
        tokio::spawn(watch_exit(
            child,
            kill_rx,
            Arc::clone(&state),
            command.clone(),
            crashes,
        ));

        info!(?pid, %command, log = %log_file.display(), "Spawned process");

        Ok(Self {
            pid,
            command,
            started_at: Utc::now(),
            output,
            state,
            kill_tx,
        })
    }

    /// OS process id.
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Command line the process was started with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// When the process was spawned.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// File currently receiving the process output.
    pub fn log_file(&self) -> std::path::PathBuf {
        self.output.path()
    }

    /// True until the exit of the process has been observed.
    pub fn is_running(&self) -> bool {
        !self.state.exited.is_cancelled()
    }

    /// Exit details, once the process has exited.
    pub fn exit_report(&self) -> Option<ExitReport> {
        self.state
            .report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait for the process to exit, for whatever reason.
    pub async fn exited(&self) -> ExitReport {
        self.state.exited.cancelled().await;
        self.exit_report().unwrap_or_default()
    }

    /// Send the graceful interrupt and wait for the exit event.
    ///
    /// No-op when the process is not running. Does not impose a deadline;
    /// see [`super::shutdown_within`].
    pub async fn terminate(&self) -> LoaderResult<()> {
        if !self.is_running() {
            return Ok(());
        }

        self.state.terminating.store(true, Ordering::SeqCst);
        debug!(pid = ?self.pid, "Sending SIGINT");
        if !shutdown::interrupt(self.pid)? {
            // No graceful signal on this platform
            let _ = self.kill_tx.send(());
        }

        self.state.exited.cancelled().await;
        Ok(())
    }

    /// Kill the process forcefully and wait until it is reaped.
    pub async fn kill(&self) {
        if !self.is_running() {
            return;
        }
        self.state.terminating.store(true, Ordering::SeqCst);
        let _ = self.kill_tx.send(());
        self.state.exited.cancelled().await;
    }

    /// Append the rest of the process output to another file.
    pub fn redirect_output(&self, log_file: &Path) -> LoaderResult<()> {
        self.output.redirect(log_file)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if self.is_running() {
            debug!(pid = ?self.pid, "Handle dropped while process running, killing");
            self.state.terminating.store(true, Ordering::SeqCst);
            let _ = self.kill_tx.send(());
        }
    }
}

/// Reap `child`, record the exit and report it if it was not requested.
async fn watch_exit(
    mut child: Child,
    mut kill_rx: mpsc::UnboundedReceiver<()>,
    state: Arc<ExitState>,
    command: String,
    crashes: CrashMonitor,
) {
    let pid = child.id();
    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(()) = kill_rx.recv() => {
                debug!(?pid, "Killing process");
                if let Err(e) = child.start_kill() {
                    debug!(?pid, error = %e, "start_kill failed, process probably gone");
                }
            }
        }
    };

    let requested = state.terminating.load(Ordering::SeqCst);
    let report = match status {
        Ok(status) => ExitReport::from_status(status, requested),
        Err(e) => ExitReport {
            requested,
            error: Some(e.to_string()),
            ..ExitReport::default()
        },
    };

    let reason = report.reason();
    let clean = report.is_clean();
    *state.report.lock().unwrap_or_else(PoisonError::into_inner) = Some(report);
    state.exited.cancel();

    // Handle state is final before anyone waiting on the crash wakes up
    if clean {
        info!(?pid, %reason, requested, "Process stopped");
    } else {
        crashes.report(command, reason);
    }
}
