//! CLI-specific error types and mappings.
//!
//! Maps loader and configuration errors to exit codes.

use osrm_loader_runtime::{ConfigError, LoaderError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid arguments, including unknown strategy names.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server did not come up or go down in time.
    #[error("{0}")]
    Timeout(String),

    /// osrm-routed exited unexpectedly.
    #[error("{0}")]
    Crashed(String),

    /// A tool could not be started or failed.
    #[error("Process error: {0}")]
    Process(String),

    /// IO error (log file, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to an exit code (sysexits.h where one fits).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Crashed(_) => 3,
            Self::Timeout(_) => 75, // EX_TEMPFAIL
            Self::Process(_) => 71, // EX_OSERR
            Self::Io(_) => 74,      // EX_IOERR
            Self::Config(_) => 78,  // EX_CONFIG
        }
    }
}

impl From<LoaderError> for CliError {
    fn from(err: LoaderError) -> Self {
        let message = err.to_string();
        match err {
            LoaderError::UnknownStrategy(_) => Self::Arguments(message),
            LoaderError::ConnectionTimeout { .. } | LoaderError::ShutdownTimeout { .. } => {
                Self::Timeout(message)
            }
            LoaderError::ProcessCrashed { .. } => Self::Crashed(message),
            LoaderError::AlreadyRunning
            | LoaderError::PrepareFailed { .. }
            | LoaderError::Spawn { .. } => Self::Process(message),
            LoaderError::LogFile { .. } | LoaderError::Io(_) => Self::Io(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_loader_errors_map_to_exit_codes() {
        let cases = [
            (LoaderError::UnknownStrategy("x".into()), 2),
            (
                LoaderError::ProcessCrashed {
                    command: "osrm-routed".into(),
                    reason: "exited with code 1".into(),
                },
                3,
            ),
            (
                LoaderError::ConnectionTimeout {
                    timeout: Duration::from_millis(5),
                },
                75,
            ),
            (
                LoaderError::PrepareFailed {
                    code: Some(3),
                    output: String::new(),
                },
                71,
            ),
            (LoaderError::AlreadyRunning, 71),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn test_message_is_kept() {
        let err = CliError::from(LoaderError::UnknownStrategy("teleport".into()));
        assert_eq!(
            err.to_string(),
            "Invalid arguments: *** Unknown load method teleport"
        );
    }

    #[test]
    fn test_config_error() {
        let err = CliError::from(ConfigError::Empty("OSRM_IP".into()));
        assert_eq!(err.exit_code(), 78);
    }
}
