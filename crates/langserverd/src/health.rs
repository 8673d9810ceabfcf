//! Structured health reporting for daemon lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use langserver_config::Config;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once a worker thread is running.
    fn worker_started(&self, worker: usize);

    /// Invoked when a worker terminates unexpectedly, taking `sessions`
    /// connections with it.
    fn worker_lost(&self, worker: usize, sessions: usize);

    /// Invoked when the listener starts accepting on `address`.
    fn listener_ready(&self, address: SocketAddr);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn worker_started(&self, worker: usize) {
        (**self).worker_started(worker);
    }

    fn worker_lost(&self, worker: usize, sessions: usize) {
        (**self).worker_lost(worker, sessions);
    }

    fn listener_ready(&self, address: SocketAddr) {
        (**self).listener_ready(address);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            host = %config.host(),
            port = config.port(),
            workers = config.cluster_size().get(),
            strict = config.strict(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn worker_started(&self, worker: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "worker_started",
            worker,
            "worker started"
        );
    }

    fn worker_lost(&self, worker: usize, sessions: usize) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "worker_lost",
            worker,
            sessions,
            "worker terminated unexpectedly; its connections were closed"
        );
    }

    fn listener_ready(&self, address: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            address = %address,
            "accepting connections"
        );
    }
}
