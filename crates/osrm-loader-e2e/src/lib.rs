//! End-to-end tests for the OSRM loader.
//!
//! The `fake-osrm` binary stands in for both OSRM tools. Tests link it into
//! a temporary build directory as `osrm-routed` and `osrm-datastore`; the
//! executable name selects the behaviour.
//!
//! Every invocation is appended to the file named by `FAKE_OSRM_RECORD`, one
//! line per process: `<tool> <args...>`.

/// Environment variable naming the invocation record file.
pub const RECORD_ENV: &str = "FAKE_OSRM_RECORD";
