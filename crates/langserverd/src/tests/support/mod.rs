//! Shared fixtures and helpers for daemon tests.

mod client;
mod config_loader;
mod daemon_world;
mod factory;
mod reporter;

pub use client::{Client, position_params};
pub use config_loader::{FailingConfigLoader, loopback_loader};
pub use daemon_world::{DaemonWorld, world};
pub use factory::TrapFactory;
pub use reporter::{HealthEvent, RecordingHealthReporter};
