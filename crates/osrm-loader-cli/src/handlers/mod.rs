//! Command handlers.
//!
//! Each handler takes the resolved [`LoaderConfig`](osrm_loader_runtime::LoaderConfig)
//! and returns `anyhow::Result`, with loader failures wrapped in
//! [`CliError`](crate::CliError) so `main` can pick the exit code.

pub mod probe;
pub mod run;
