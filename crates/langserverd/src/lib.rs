//! Language server cluster daemon.
//!
//! The daemon listens on a TCP address and spreads accepted connections
//! across a fixed pool of worker threads. Each worker runs one
//! [`langserver_protocol::Session`] per connection, serving a
//! [`langserver_protocol::LanguageHandler`] built by the configured
//! [`HandlerFactory`].
//!
//! Start-up is split in two. [`bootstrap_with`] resolves configuration and
//! installs telemetry, reporting each stage to a [`HealthReporter`];
//! [`Daemon::start`] then starts every worker before the listener accepts
//! its first connection. [`DaemonHandle::shutdown`] reverses the order: the
//! accept loop stops first, then each worker closes the sessions it hosts.
//!
//! Until an analysis backend is plugged in, [`run_daemon`] serves the
//! [`PlaceholderHandler`], which completes the protocol handshake and answers
//! queries with empty results.

mod bootstrap;
mod cluster;
mod health;
mod placeholder_handler;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use cluster::{Cluster, ClusterError, ClusterOptions, HandlerFactory, SessionContext};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use placeholder_handler::PlaceholderHandler;
pub use process::{
    DaemonHandle, LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon,
    run_daemon_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ConnectionHandler, ListenerError, ListenerHandle, TcpSocketListener};
