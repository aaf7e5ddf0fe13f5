//! Forwarding of child output into per-scenario log files.
//!
//! osrm-routed can emit non-UTF8 bytes on stdout/stderr. Using
//! `BufReader::lines()` would terminate the reader task on invalid UTF-8, so
//! lines are read as bytes and decoded lossily.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use osrm_loader_core::{LoaderError, LoaderResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

/// Append-mode log sink shared by the stdout and stderr readers of one process.
///
/// The target file can be swapped while the process is running so that a
/// reused server keeps writing into the current scenario's log.
#[derive(Debug)]
pub struct OutputLog {
    target: Mutex<LogTarget>,
}

#[derive(Debug)]
struct LogTarget {
    path: PathBuf,
    file: File,
}

impl OutputLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let path = path.as_ref();
        Ok(Self {
            target: Mutex::new(LogTarget {
                path: path.to_path_buf(),
                file: open_append(path)?,
            }),
        })
    }

    /// Point the sink at another file; subsequent lines go there.
    pub fn redirect(&self, path: impl AsRef<Path>) -> LoaderResult<()> {
        let path = path.as_ref();
        let file = open_append(path)?;
        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = %target.path.display(), to = %path.display(), "Redirecting process output");
        *target = LogTarget {
            path: path.to_path_buf(),
            file,
        };
        Ok(())
    }

    /// Current target file.
    pub fn path(&self) -> PathBuf {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .path
            .clone()
    }

    /// Append one line (newline added).
    ///
    /// Blocking write under a std mutex, called from the reader tasks; fine
    /// for osrm-routed's log volume, never held across an await.
    pub fn append_line(&self, line: &str) {
        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(target.file, "{line}") {
            debug!(path = %target.path.display(), error = %e, "Failed to write log line");
        }
    }
}

/// Append raw bytes to a log file, creating it if needed.
pub fn append_to_file(path: impl AsRef<Path>, bytes: &[u8]) -> LoaderResult<()> {
    let path = path.as_ref();
    let mut file = open_append(path)?;
    file.write_all(bytes)?;
    Ok(())
}

fn open_append(path: &Path) -> LoaderResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoaderError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Spawn a task forwarding one output stream of a child into `sink`.
///
/// Ends when the child closes the stream or a read fails.
pub(crate) fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    pid: Option<u32>,
    stream_type: &'static str,
    sink: Arc<OutputLog>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    // Line terminator is re-added by the sink
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf);
                    debug!(?pid, %stream_type, "{}", line);
                    sink.append_line(&line);
                }
                Err(e) => {
                    debug!(?pid, %stream_type, error = %e, "output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(?pid, %stream_type, "output reader task exiting");
    })
}
