//! `osrm-loader` command-line driver.
//!
//! Brings `osrm-routed` up with one of the load strategies and keeps it
//! running, or probes an already running server for readiness.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::build_config;
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
