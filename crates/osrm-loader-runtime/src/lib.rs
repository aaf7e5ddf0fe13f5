//! Lifecycle supervision for the `osrm-routed` server used by the
//! integration-test harness.
//!
//! # Structure
//!
//! - [`process`] - one child process: spawn, output forwarding, termination
//! - [`readiness`] - TCP readiness probe
//! - [`command`] - command lines for every strategy
//! - [`strategy`] - the `direct`, `mmap` and `datastore` load strategies
//! - [`LoaderFacade`] - strategy switching, at most one live server

#![deny(unsafe_code)]

pub mod command;
mod facade;
pub mod process;
pub mod readiness;
pub mod strategy;

pub use command::LaunchCommand;
pub use facade::LoaderFacade;
pub use process::{CrashMonitor, ExitReport, OutputLog, ProcessHandle};
pub use readiness::wait_for_ready;
pub use strategy::{DatastoreLoader, DirectLoader, LoadStrategy, ServerInfo};

// Re-export the domain vocabulary so adapters need a single import
pub use osrm_loader_core::{
    ConfigError, Dataset, LoaderConfig, LoaderError, LoaderResult, StrategyKind,
};
