//! Fixed pool of workers that accepted connections are spread across.
//!
//! The cluster starts every worker before it is handed to the listener, then
//! assigns each connection to the next worker in round-robin order. A worker
//! owns the protocol sessions of its connections; the cluster itself keeps no
//! protocol state, only the per-worker assignment counters.
//!
//! A worker that panics closes every session it hosts and is never restarted.
//! The round-robin skips it from then on, and once no worker is left new
//! connections are closed straight away.

mod errors;
mod factory;
mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use langserver_config::Config;
use langserver_protocol::{ConnectionStream, ShutdownPolicy};
use tracing::{info, warn};

pub use errors::ClusterError;
pub use factory::{HandlerFactory, SessionContext};

use crate::health::HealthReporter;
use crate::transport::ConnectionHandler;
use worker::Worker;

pub(crate) const CLUSTER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cluster");

/// Per-session settings shared by every worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Log every payload exchanged on each connection.
    pub trace: bool,
    /// Reject protocol misuse such as a repeated `shutdown`.
    pub strict: bool,
}

impl ClusterOptions {
    /// Options taken from the daemon configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            trace: config.trace(),
            strict: config.strict(),
        }
    }

    /// Shutdown handling applied to each session.
    #[must_use]
    pub fn shutdown_policy(self) -> ShutdownPolicy {
        if self.strict {
            ShutdownPolicy::Strict
        } else {
            ShutdownPolicy::Idempotent
        }
    }
}

/// Round-robin dispatcher over a fixed set of worker threads.
pub struct Cluster {
    workers: Vec<Worker>,
    next: AtomicUsize,
}

impl Cluster {
    /// Starts `size` workers that build handlers with `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NoWorkers`] when `size` is zero and
    /// [`ClusterError::Spawn`] when a worker thread cannot start; workers
    /// started before the failure are stopped again.
    pub fn start<F: HandlerFactory>(
        size: usize,
        factory: F,
        options: ClusterOptions,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<Self, ClusterError> {
        if size == 0 {
            return Err(ClusterError::NoWorkers);
        }
        let factory = Arc::new(factory);
        let mut cluster = Self {
            workers: Vec::with_capacity(size),
            next: AtomicUsize::new(0),
        };
        for index in 0..size {
            let worker = match Worker::spawn(
                index,
                Arc::clone(&factory),
                options,
                Arc::clone(&reporter),
            ) {
                Ok(worker) => worker,
                Err(error) => {
                    cluster.shutdown();
                    return Err(error);
                }
            };
            reporter.worker_started(index);
            cluster.workers.push(worker);
        }
        info!(
            target: CLUSTER_TARGET,
            workers = size,
            strict = options.strict,
            trace = options.trace,
            "cluster started"
        );
        Ok(cluster)
    }

    /// Number of workers started, including lost ones.
    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers still accepting connections.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.workers.iter().filter(|worker| worker.is_alive()).count()
    }

    /// Connections handed to each worker so far, indexed by worker.
    #[must_use]
    pub fn assignments(&self) -> Vec<usize> {
        self.workers.iter().map(Worker::assigned).collect()
    }

    /// Sessions each worker still holds. Ended sessions are released within
    /// a short interval even when no new connections arrive.
    #[must_use]
    pub fn hosted_sessions(&self) -> Vec<usize> {
        self.workers.iter().map(Worker::hosted).collect()
    }

    /// Assigns `stream` to the next live worker.
    ///
    /// The stream is closed when every worker has been lost.
    pub fn dispatch(&self, stream: ConnectionStream) {
        let count = self.workers.len();
        let start = self.next.fetch_add(1, Ordering::SeqCst);
        let mut stream = stream;
        for offset in 0..count {
            let slot = start.wrapping_add(offset) % count;
            let Some(worker) = self.workers.get(slot) else {
                continue;
            };
            match worker.assign(stream) {
                Ok(()) => return,
                Err(returned) => stream = returned,
            }
        }
        warn!(
            target: CLUSTER_TARGET,
            peer = %stream,
            "no live workers; closing connection"
        );
        if let Err(error) = stream.shutdown() {
            warn!(
                target: CLUSTER_TARGET,
                error = %error,
                "failed to close rejected connection"
            );
        }
    }

    /// Stops every worker and waits for their sessions to close.
    pub fn shutdown(&self) {
        for worker in &self.workers {
            worker.stop();
        }
        let lost = self
            .workers
            .iter()
            .filter(|worker| !worker.join())
            .map(Worker::index)
            .collect::<Vec<_>>();
        info!(
            target: CLUSTER_TARGET,
            lost = ?lost,
            "cluster stopped"
        );
    }
}

impl ConnectionHandler for Cluster {
    fn handle(&self, stream: ConnectionStream) {
        self.dispatch(stream);
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.stop();
        }
    }
}
