//! Child process supervision.
//!
//! - `ProcessHandle` - owns one spawned process and its exit watcher
//! - `OutputLog` - append-mode log file receiving stdout and stderr
//! - `CrashMonitor` - run-wide record of unexpected exits
//! - `shutdown_within` - SIGINT with deadline, SIGKILL escalation

mod crash;
mod handle;
mod output;
mod shutdown;

pub use crash::{CrashMonitor, CrashReport};
pub use handle::{ExitReport, ProcessHandle};
pub use output::{OutputLog, append_to_file};
pub use shutdown::shutdown_within;
