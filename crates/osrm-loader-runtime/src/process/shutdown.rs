//! Graceful shutdown with a deadline and SIGKILL escalation.

use std::io;
use std::time::Duration;

use osrm_loader_core::{LoaderError, LoaderResult};
use tokio::time::timeout;
use tracing::{info, warn};

use super::handle::ProcessHandle;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Send SIGINT to `pid`.
///
/// Returns `Ok(false)` when no graceful signal could be delivered and the
/// caller has to fall back to a forceful kill.
#[cfg(unix)]
pub(crate) fn interrupt(pid: Option<u32>) -> io::Result<bool> {
    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return Ok(false);
    };

    match signal::kill(Pid::from_raw(pid), Signal::SIGINT) {
        Ok(()) => Ok(true),
        // Already gone, the watcher will observe the exit
        Err(nix::errno::Errno::ESRCH) => Ok(true),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(unix))]
pub(crate) fn interrupt(_pid: Option<u32>) -> io::Result<bool> {
    // Windows has no SIGINT equivalent for arbitrary processes
    Ok(false)
}

/// Gracefully stop `handle` within `deadline`.
///
/// # Strategy
/// 1. Send SIGINT and wait up to `deadline` for the exit event
/// 2. If still running, kill the process and wait for reaping
/// 3. Report `ShutdownTimeout` so the caller knows the stop was not clean
pub async fn shutdown_within(handle: &ProcessHandle, deadline: Duration) -> LoaderResult<()> {
    if !handle.is_running() {
        return Ok(());
    }

    match timeout(deadline, handle.terminate()).await {
        Ok(result) => {
            result?;
            info!(pid = ?handle.pid(), "osrm-routed shut down");
            Ok(())
        }
        Err(_) => {
            warn!(
                pid = ?handle.pid(),
                timeout_ms = %deadline.as_millis(),
                "Graceful shutdown timed out, escalating to SIGKILL"
            );
            handle.kill().await;
            Err(LoaderError::ShutdownTimeout { timeout: deadline })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::command::LaunchCommand;
    use crate::process::CrashMonitor;
    use tempfile::TempDir;

    #[tokio::test]
    async fn shutdown_responds_to_sigint() {
        let dir = TempDir::new().unwrap();
        let handle = ProcessHandle::spawn(
            &LaunchCommand::new("sleep").arg("30"),
            &dir.path().join("p.log"),
            CrashMonitor::new(),
        )
        .unwrap();

        tokio_test::assert_ok!(shutdown_within(&handle, Duration::from_secs(5)).await);
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn shutdown_escalates_when_sigint_is_ignored() {
        let dir = TempDir::new().unwrap();
        let crashes = CrashMonitor::new();
        let handle = ProcessHandle::spawn(
            &LaunchCommand::new("sh")
                .arg("-c")
                .arg("trap '' INT; while true; do sleep 1; done"),
            &dir.path().join("p.log"),
            crashes.clone(),
        )
        .unwrap();

        // Let the shell install its trap
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = shutdown_within(&handle, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(
            matches!(err, LoaderError::ShutdownTimeout { timeout } if timeout == Duration::from_millis(200))
        );
        assert!(!handle.is_running());
        assert!(!crashes.is_halted());
    }

    #[test]
    fn interrupt_without_pid_requests_fallback() {
        assert!(!interrupt(None).unwrap());
    }
}
