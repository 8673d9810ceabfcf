//! Process-level orchestration: starting the daemon, waiting for a
//! termination signal and tearing everything down in order.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::{DaemonHandle, run_daemon, run_daemon_with};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
