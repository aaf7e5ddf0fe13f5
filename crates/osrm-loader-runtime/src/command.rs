//! Command lines for osrm-routed and osrm-datastore.
//!
//! Each strategy launches the server differently:
//!
//! | strategy  | program          | arguments |
//! |-----------|------------------|-----------|
//! | direct    | `osrm-routed`    | `<input> -p <port> -i <ip> -a <alg> <extra>` |
//! | mmap      | `osrm-routed`    | `<input> -p <port> -i <ip> -a <alg> --mmap <extra>` |
//! | datastore | `osrm-datastore` | `--dataset-name=<name> <input> <extra>` |
//! | datastore | `osrm-routed`    | `--dataset-name=<name> -s -i <ip> -p <port> -a <alg>` |

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::process::{Output, Stdio};

use osrm_loader_core::{Dataset, LoaderConfig, LoaderError, LoaderResult};
use tokio::process::Command;

/// Name of the routing server binary.
pub const ROUTED: &str = "osrm-routed";

/// Name of the shared-memory publishing tool.
pub const DATASTORE: &str = "osrm-datastore";

/// A program with its arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub env: Vec<(String, String)>,
}

impl LaunchCommand {
    /// Command without arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set the extra environment variables.
    #[must_use]
    pub fn envs(mut self, env: &[(String, String)]) -> Self {
        self.env = env.to_vec();
        self
    }

    /// Arguments as lossy strings, for logging and assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Run to completion, capturing stdout and stderr.
    pub async fn output(&self) -> LoaderResult<Output> {
        Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| LoaderError::Spawn {
                command: self.to_string(),
                source,
            })
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// `osrm-routed` reading the dataset from disk, optionally memory-mapped.
pub fn routed_from_file(config: &LoaderConfig, dataset: &Dataset, mmap: bool) -> LaunchCommand {
    let mut cmd = LaunchCommand::new(config.binary(ROUTED))
        .arg(&dataset.input_file)
        .arg("-p")
        .arg(config.port.to_string())
        .arg("-i")
        .arg(&config.host)
        .arg("-a")
        .arg(&config.algorithm);

    if mmap {
        cmd = cmd.arg("--mmap");
    }

    cmd.args(&dataset.loader_args).envs(&config.environment)
}

/// `osrm-routed` attaching to the shared-memory dataset.
pub fn routed_shared_memory(config: &LoaderConfig) -> LaunchCommand {
    LaunchCommand::new(config.binary(ROUTED))
        .arg(dataset_name_flag(config))
        .arg("-s")
        .arg("-i")
        .arg(&config.host)
        .arg("-p")
        .arg(config.port.to_string())
        .arg("-a")
        .arg(&config.algorithm)
        .envs(&config.environment)
}

/// `osrm-datastore` publishing `dataset` into the named shared-memory segment.
pub fn datastore(config: &LoaderConfig, dataset: &Dataset) -> LaunchCommand {
    LaunchCommand::new(config.binary(DATASTORE))
        .arg(dataset_name_flag(config))
        .arg(&dataset.input_file)
        .args(&dataset.loader_args)
        .envs(&config.environment)
}

fn dataset_name_flag(config: &LoaderConfig) -> String {
    format!("--dataset-name={}", config.dataset_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoaderConfig {
        LoaderConfig {
            port: 5010,
            dataset_name: "test".to_string(),
            ..LoaderConfig::default()
        }
        .with_env("OSRM_RAYON_THREADS", "1")
    }

    #[test]
    fn test_direct_command_line() {
        let dataset = Dataset::new("valid.osrm").with_loader_args(["--max-table-size", "100"]);
        let cmd = routed_from_file(&config(), &dataset, false);

        assert_eq!(cmd.program, PathBuf::from("osrm-routed"));
        assert_eq!(
            cmd.args_lossy(),
            vec![
                "valid.osrm",
                "-p",
                "5010",
                "-i",
                "127.0.0.1",
                "-a",
                "CH",
                "--max-table-size",
                "100"
            ]
        );
        assert_eq!(cmd.env, vec![("OSRM_RAYON_THREADS".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_mmap_flag_precedes_extra_args() {
        let dataset = Dataset::new("valid.osrm").with_loader_args(["-t", "2"]);
        let cmd = routed_from_file(&config(), &dataset, true);

        assert_eq!(
            cmd.args_lossy(),
            vec![
                "valid.osrm",
                "-p",
                "5010",
                "-i",
                "127.0.0.1",
                "-a",
                "CH",
                "--mmap",
                "-t",
                "2"
            ]
        );
    }

    #[test]
    fn test_shared_memory_command_has_no_dataset_path() {
        let cmd = routed_shared_memory(&config());
        assert_eq!(
            cmd.args_lossy(),
            vec![
                "--dataset-name=test",
                "-s",
                "-i",
                "127.0.0.1",
                "-p",
                "5010",
                "-a",
                "CH"
            ]
        );
    }

    #[test]
    fn test_datastore_command_line() {
        let dataset = Dataset::new("other.osrm").with_loader_args(["--only-metric"]);
        let cmd = datastore(&config().with_bin_dir("/opt/osrm"), &dataset);

        assert_eq!(cmd.program, PathBuf::from("/opt/osrm/osrm-datastore"));
        assert_eq!(
            cmd.args_lossy(),
            vec!["--dataset-name=test", "other.osrm", "--only-metric"]
        );
    }

    #[test]
    fn test_display_joins_program_and_args() {
        let cmd = LaunchCommand::new("osrm-routed").arg("-s").arg("-p").arg("5000");
        assert_eq!(cmd.to_string(), "osrm-routed -s -p 5000");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_output_captures_exit_code() {
        let out = LaunchCommand::new("sh")
            .arg("-c")
            .arg("echo published; exit 4")
            .output()
            .await
            .unwrap();
        assert_eq!(out.status.code(), Some(4));
        assert_eq!(String::from_utf8_lossy(&out.stdout), "published\n");
    }
}
