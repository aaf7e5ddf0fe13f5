//! Shared fixture: a temporary OSRM build directory backed by `fake-osrm`.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;

use osrm_loader_e2e::RECORD_ENV;
use osrm_loader_runtime::LoaderConfig;
use tempfile::TempDir;

/// Temporary build directory with `osrm-routed` and `osrm-datastore`.
pub struct FakeOsrm {
    pub dir: TempDir,
    pub port: u16,
}

impl FakeOsrm {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let fake = Path::new(env!("CARGO_BIN_EXE_fake-osrm"));
        for tool in ["osrm-routed", "osrm-datastore"] {
            std::os::unix::fs::symlink(fake, dir.path().join(tool)).expect("link fake tool");
        }
        Self {
            dir,
            port: free_port(),
        }
    }

    /// Loader configuration pointing at the fake tools.
    pub fn config(&self, timeout: Duration) -> LoaderConfig {
        LoaderConfig {
            port: self.port,
            ..LoaderConfig::default()
        }
        .with_bin_dir(self.dir.path())
        .with_env(RECORD_ENV, self.record_file().to_string_lossy())
        .with_timeout(timeout)
    }

    pub fn record_file(&self) -> PathBuf {
        self.dir.path().join("invocations.txt")
    }

    pub fn log(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Recorded invocations, one `<tool> <args>` line each.
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(self.record_file())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn count(&self, tool: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|line| line.split(' ').next() == Some(tool))
            .count()
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|addr| addr.port())
        .expect("reserve a port")
}

/// Poll `path` until it contains `needle` or two seconds passed.
pub async fn wait_for_log(path: &Path, needle: &str) -> bool {
    for _ in 0..200 {
        if std::fs::read_to_string(path).is_ok_and(|c| c.contains(needle)) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
