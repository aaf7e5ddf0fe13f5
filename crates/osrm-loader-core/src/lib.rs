//! Core domain types for the OSRM process loader.
//!
//! This crate holds everything the runtime and the CLI agree on without
//! touching processes or sockets:
//!
//! - [`LoaderConfig`] - host/port, algorithm, dataset name, timeout, binaries
//! - [`Dataset`] - input file plus free-form loader arguments
//! - [`StrategyKind`] - the three ways of loading a dataset
//! - [`LoaderError`] / [`ConfigError`] - the error vocabulary

pub mod config;
pub mod dataset;
pub mod error;
pub mod strategy;

pub use config::{
    DEFAULT_ALGORITHM, DEFAULT_DATASET_NAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT,
    LoaderConfig,
};
pub use dataset::Dataset;
pub use error::{ConfigError, LoaderError, LoaderResult};
pub use strategy::StrategyKind;
