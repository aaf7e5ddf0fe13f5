//! Error types for loader operations.
//!
//! Every failure of a `load` or `shutdown` call is expressed as a
//! [`LoaderError`] and surfaces unchanged to the caller. Nothing here is
//! retried or downgraded to a warning.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the process loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    // === Lifecycle ===
    /// The `up` step of a strategy found its own server still live.
    #[error("osrm-routed already running!")]
    AlreadyRunning,

    /// The one-shot `osrm-datastore` publish step exited non-zero.
    #[error("osrm-datastore exited with {}: {output}", format_code(.code))]
    PrepareFailed {
        /// Exit code, `None` when the tool was terminated by a signal.
        code: Option<i32>,
        /// Captured stdout and stderr of the tool.
        output: String,
    },

    /// The managed server exited without being asked to.
    ///
    /// This is fatal for the whole test run: every later result would be
    /// attributed to a server that no longer exists.
    #[error("{command} {reason}")]
    ProcessCrashed {
        /// Command line of the crashed process.
        command: String,
        /// Human-readable exit reason (exit code or signal).
        reason: String,
    },

    // === Deadlines ===
    /// The server never accepted a TCP connection within the deadline.
    #[error("Could not connect to osrm-routed after {} ms.", .timeout.as_millis())]
    ConnectionTimeout { timeout: Duration },

    /// Graceful termination did not complete within the deadline.
    #[error("*** Shutting down osrm-routed timed out after {} ms.", .timeout.as_millis())]
    ShutdownTimeout { timeout: Duration },

    // === Selection ===
    /// An unrecognized strategy name was selected.
    #[error("*** Unknown load method {0}")]
    UnknownStrategy(String),

    // === OS ===
    /// The process could not be started at all.
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The scenario log file could not be opened for appending.
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoaderError {
    /// Whether this error must halt the surrounding test run.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ProcessCrashed { .. })
    }
}

#[allow(clippy::ref_option)]
fn format_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Result type alias for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised while reading [`crate::LoaderConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was present but could not be parsed.
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A variable was present but empty.
    #[error("{0} cannot be empty")]
    Empty(String),
}
