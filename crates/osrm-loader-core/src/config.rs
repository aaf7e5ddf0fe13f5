//! Loader configuration.
//!
//! Supplied externally at construction and read-only afterwards. Values come
//! from the environment (`OSRM_*` variables) with defaults matching the
//! cucumber harness the loader was written for.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bind and probe address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind and probe port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default routing algorithm passed as `-a`.
pub const DEFAULT_ALGORITHM: &str = "CH";

/// Default shared-memory dataset name for the datastore strategy.
pub const DEFAULT_DATASET_NAME: &str = "cucumber";

/// Default global timeout for readiness and shutdown.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

const ENV_HOST: &str = "OSRM_IP";
const ENV_PORT: &str = "OSRM_PORT";
const ENV_ALGORITHM: &str = "OSRM_ROUTING_ALGORITHM";
const ENV_DATASET_NAME: &str = "OSRM_DATASET_NAME";
const ENV_TIMEOUT_MS: &str = "OSRM_TIMEOUT_MS";
const ENV_LOAD_METHOD: &str = "OSRM_LOAD_METHOD";
const ENV_BUILD_DIR: &str = "OSRM_BUILD_DIR";

/// Configuration consumed by the loader core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Address the server binds to and the probe connects to.
    pub host: String,
    /// Port the server binds to and the probe connects to.
    pub port: u16,
    /// Routing algorithm identifier (`CH`, `MLD`, ...).
    pub algorithm: String,
    /// Name of the shared-memory dataset published by `osrm-datastore`.
    pub dataset_name: String,
    /// Deadline for readiness and for graceful shutdown.
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    /// Extra environment variables for every child process.
    pub environment: Vec<(String, String)>,
    /// Strategy name selected before the first `set_strategy` call.
    pub default_strategy: String,
    /// Directory holding `osrm-routed` and `osrm-datastore`; `PATH` if unset.
    pub bin_dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            algorithm: DEFAULT_ALGORITHM.to_string(),
            dataset_name: DEFAULT_DATASET_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            environment: Vec::new(),
            default_strategy: "datastore".to_string(),
            bin_dir: None,
        }
    }
}

impl LoaderConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Missing keys keep their defaults. Used by tests so they never have to
    /// mutate the real environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = non_empty(ENV_HOST, host)?;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = parse_number(ENV_PORT, &port)?;
        }
        if let Some(algorithm) = lookup(ENV_ALGORITHM) {
            config.algorithm = non_empty(ENV_ALGORITHM, algorithm)?;
        }
        if let Some(name) = lookup(ENV_DATASET_NAME) {
            config.dataset_name = non_empty(ENV_DATASET_NAME, name)?;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            config.timeout = Duration::from_millis(parse_number(ENV_TIMEOUT_MS, &timeout)?);
        }
        if let Some(method) = lookup(ENV_LOAD_METHOD) {
            config.default_strategy = non_empty(ENV_LOAD_METHOD, method)?;
        }
        if let Some(dir) = lookup(ENV_BUILD_DIR).filter(|d| !d.trim().is_empty()) {
            config.bin_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Add an environment variable for child processes.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }

    /// Set the global timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the directory the OSRM binaries are resolved from.
    #[must_use]
    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(dir.into());
        self
    }

    /// Resolve the program to execute for an OSRM tool name.
    pub fn binary(&self, name: &str) -> PathBuf {
        self.bin_dir
            .as_deref()
            .map_or_else(|| PathBuf::from(name), |dir: &Path| dir.join(name))
    }

    /// `host:port` string used for logging and probing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(key: &str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(key.to_string()));
    }
    Ok(value)
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
