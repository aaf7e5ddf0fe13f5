//! Strategy-switching façade.
//!
//! The single entry point for the harness. Holds one instance of every
//! strategy, remembers which one owns the live server and tears it down
//! before a different strategy is brought up, so that the port and the
//! shared-memory segment are never addressed by two servers at once.
//!
//! ```text
//! Idle --load--> <kind>Active --shutdown--> Idle
//!                <kind>Active --load(other kind)--> teardown --> <other>Active
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use osrm_loader_core::{Dataset, LoaderConfig, LoaderError, LoaderResult, StrategyKind};
use tracing::{debug, info};

use crate::process::CrashMonitor;
use crate::strategy::{DatastoreLoader, DirectLoader, LoadStrategy, ServerInfo};

/// Log file used until the harness sets a per-scenario one.
const DEFAULT_LOG_FILE: &str = "osrm-routed.log";

/// Loader façade owning every strategy and at most one live server.
pub struct LoaderFacade {
    config: Arc<LoaderConfig>,
    crashes: CrashMonitor,
    strategies: Vec<Box<dyn LoadStrategy>>,
    selected: String,
    active: Option<StrategyKind>,
    log_file: PathBuf,
}

impl LoaderFacade {
    /// Build the façade with the three standard strategies.
    pub fn new(config: LoaderConfig) -> Self {
        let config = Arc::new(config);
        let crashes = CrashMonitor::new();
        let strategies: Vec<Box<dyn LoadStrategy>> = vec![
            Box::new(DirectLoader::new(Arc::clone(&config), crashes.clone())),
            Box::new(DirectLoader::mmap(Arc::clone(&config), crashes.clone())),
            Box::new(DatastoreLoader::new(Arc::clone(&config), crashes.clone())),
        ];
        Self::with_strategies(config, crashes, strategies)
    }

    /// Build the façade from explicit strategy instances.
    ///
    /// `crashes` must be the monitor the strategies report to.
    pub fn with_strategies(
        config: Arc<LoaderConfig>,
        crashes: CrashMonitor,
        strategies: Vec<Box<dyn LoadStrategy>>,
    ) -> Self {
        let selected = config.default_strategy.clone();
        Self {
            config,
            crashes,
            strategies,
            selected,
            active: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }

    /// Select the strategy for the next `load`.
    ///
    /// Names are validated lazily: an unknown name fails the next `load`.
    pub fn set_strategy(&mut self, name: impl Into<String>) {
        self.selected = name.into();
        debug!(strategy = %self.selected, "Load strategy selected");
    }

    /// Currently selected strategy name.
    pub fn selected_strategy(&self) -> &str {
        &self.selected
    }

    /// Set the per-scenario log file for subsequent loads.
    pub fn set_log_file(&mut self, path: impl Into<PathBuf>) {
        self.log_file = path.into();
    }

    /// Log file used by the next load.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Configuration the façade was built with.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Strategy that owns the live server, if any.
    pub const fn active(&self) -> Option<StrategyKind> {
        self.active
    }

    /// Load `dataset` with the selected strategy.
    ///
    /// A different active strategy is shut down first; if that fails the new
    /// strategy is never started and the error is returned unchanged. The
    /// selected strategy becomes active only when its load succeeded.
    pub async fn load(&mut self, dataset: &Dataset) -> LoaderResult<()> {
        self.crashes.check()?;
        let kind: StrategyKind = self.selected.parse()?;

        if let Some(previous) = self.active
            && previous != kind
        {
            info!(from = %previous, to = %kind, "Switching load strategy");
            self.strategy_mut(previous)?.shutdown().await?;
            self.active = None;
        }

        let log_file = self.log_file.clone();
        self.strategy_mut(kind)?.load(dataset, &log_file).await?;
        self.active = Some(kind);
        Ok(())
    }

    /// Shut down the active strategy; succeeds immediately when idle.
    pub async fn shutdown(&mut self) -> LoaderResult<()> {
        self.crashes.check()?;
        let Some(active) = self.active else {
            return Ok(());
        };

        self.strategy_mut(active)?.shutdown().await?;
        self.active = None;
        Ok(())
    }

    /// True iff an active strategy reports a live server.
    pub fn is_up(&self) -> bool {
        self.active
            .and_then(|kind| self.strategy(kind))
            .is_some_and(|s| s.is_running())
    }

    /// Details of the live server, if any.
    pub fn server_info(&self) -> Option<ServerInfo> {
        self.active
            .and_then(|kind| self.strategy(kind))
            .and_then(|s| s.server())
    }

    /// Crash channel shared with every strategy.
    pub const fn crash_monitor(&self) -> &CrashMonitor {
        &self.crashes
    }

    /// Resolve with `ProcessCrashed` once the managed server died unexpectedly.
    pub async fn halted(&self) -> LoaderError {
        self.crashes.halted().await
    }

    fn strategy(&self, kind: StrategyKind) -> Option<&dyn LoadStrategy> {
        self.strategies
            .iter()
            .find(|s| s.kind() == kind)
            .map(|s| &**s)
    }

    fn strategy_mut(&mut self, kind: StrategyKind) -> LoaderResult<&mut Box<dyn LoadStrategy>> {
        self.strategies
            .iter_mut()
            .find(|s| s.kind() == kind)
            .ok_or_else(|| LoaderError::UnknownStrategy(kind.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::MockLoadStrategy;
    use mockall::Sequence;
    use std::time::Duration;

    fn mock(kind: StrategyKind) -> MockLoadStrategy {
        let mut m = MockLoadStrategy::new();
        m.expect_kind().return_const(kind);
        m
    }

    fn facade(strategies: Vec<MockLoadStrategy>) -> LoaderFacade {
        let boxed = strategies
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn LoadStrategy>)
            .collect();
        LoaderFacade::with_strategies(
            Arc::new(LoaderConfig::default()),
            CrashMonitor::new(),
            boxed,
        )
    }

    #[tokio::test]
    async fn test_shutdown_when_idle_succeeds() {
        let mut loader = facade(vec![mock(StrategyKind::Direct)]);
        assert!(loader.shutdown().await.is_ok());
        assert!(!loader.is_up());
        assert_eq!(loader.active(), None);
    }

    #[tokio::test]
    async fn test_unknown_strategy_rejected_at_load() {
        let mut direct = mock(StrategyKind::Direct);
        direct.expect_load().never();
        direct.expect_shutdown().never();
        let mut loader = facade(vec![direct]);

        loader.set_strategy("carrier-pigeon");
        assert_eq!(loader.selected_strategy(), "carrier-pigeon");

        let err = loader.load(&Dataset::new("valid.osrm")).await.unwrap_err();
        assert!(matches!(err, LoaderError::UnknownStrategy(ref n) if n == "carrier-pigeon"));
    }

    #[tokio::test]
    async fn test_switch_tears_down_previous_first() {
        let mut seq = Sequence::new();
        let mut direct = mock(StrategyKind::Direct);
        let mut mmap = mock(StrategyKind::Mmap);

        direct
            .expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        direct
            .expect_shutdown()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        mmap.expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mmap.expect_is_running().return_const(true);

        let mut loader = facade(vec![direct, mmap]);
        loader.set_strategy("direct");
        loader.load(&Dataset::new("valid.osrm")).await.unwrap();
        assert_eq!(loader.active(), Some(StrategyKind::Direct));

        loader.set_strategy("mmap");
        loader.load(&Dataset::new("valid.osrm")).await.unwrap();
        assert_eq!(loader.active(), Some(StrategyKind::Mmap));
        assert!(loader.is_up());
    }

    #[tokio::test]
    async fn test_failed_teardown_keeps_new_strategy_down() {
        let mut direct = mock(StrategyKind::Direct);
        let mut datastore = mock(StrategyKind::Datastore);

        direct.expect_load().returning(|_, _| Ok(()));
        direct.expect_shutdown().returning(|| {
            Err(LoaderError::ShutdownTimeout {
                timeout: Duration::from_millis(200),
            })
        });
        datastore.expect_load().never();

        let mut loader = facade(vec![direct, datastore]);
        loader.set_strategy("direct");
        loader.load(&Dataset::new("valid.osrm")).await.unwrap();

        loader.set_strategy("datastore");
        let err = loader.load(&Dataset::new("valid.osrm")).await.unwrap_err();
        assert!(matches!(err, LoaderError::ShutdownTimeout { .. }));
        assert_eq!(loader.active(), Some(StrategyKind::Direct));
    }

    #[tokio::test]
    async fn test_same_strategy_is_not_torn_down_by_facade() {
        let mut datastore = mock(StrategyKind::Datastore);
        datastore.expect_load().times(2).returning(|_, _| Ok(()));
        datastore.expect_shutdown().never();

        let mut loader = facade(vec![datastore]);
        loader.set_strategy("datastore");
        loader.load(&Dataset::new("valid.osrm")).await.unwrap();
        loader.load(&Dataset::new("other.osrm")).await.unwrap();
        assert_eq!(loader.active(), Some(StrategyKind::Datastore));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_recorded_active() {
        let mut direct = mock(StrategyKind::Direct);
        direct.expect_load().returning(|_, _| {
            Err(LoaderError::ConnectionTimeout {
                timeout: Duration::from_millis(200),
            })
        });
        direct.expect_shutdown().never();

        let mut loader = facade(vec![direct]);
        loader.set_strategy("direct");
        let err = loader.load(&Dataset::new("valid.osrm")).await.unwrap_err();

        assert!(matches!(err, LoaderError::ConnectionTimeout { .. }));
        assert_eq!(loader.active(), None);
        assert!(!loader.is_up());
        assert!(loader.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn test_log_file_is_passed_to_strategy() {
        let mut direct = mock(StrategyKind::Direct);
        direct
            .expect_load()
            .withf(|dataset, log| {
                dataset.input_file == Path::new("valid.osrm") && log == Path::new("scenario-1.log")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut loader = facade(vec![direct]);
        loader.set_strategy("direct");
        loader.set_log_file("scenario-1.log");
        loader.load(&Dataset::new("valid.osrm")).await.unwrap();
    }

    #[tokio::test]
    async fn test_crash_halts_further_calls() {
        let mut direct = mock(StrategyKind::Direct);
        direct.expect_load().never();
        direct.expect_shutdown().never();
        let mut loader = facade(vec![direct]);

        loader
            .crash_monitor()
            .report("osrm-routed valid.osrm", "exited with code 1");

        let err = loader.load(&Dataset::new("valid.osrm")).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(loader.shutdown().await.unwrap_err().is_fatal());
        assert!(loader.halted().await.is_fatal());
    }

    #[test]
    fn test_default_strategy_comes_from_config() {
        let loader = LoaderFacade::new(LoaderConfig::default());
        assert_eq!(loader.selected_strategy(), "datastore");
        assert_eq!(loader.log_file(), Path::new("osrm-routed.log"));
        assert!(!loader.is_up());
        assert!(loader.server_info().is_none());
    }
}
