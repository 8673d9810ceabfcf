//! Errors raised while starting the worker pool.

use std::io;

use thiserror::Error;

/// Failures that prevent the cluster from starting.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A cluster needs at least one worker.
    #[error("cluster size must be at least one worker")]
    NoWorkers,
    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        /// Index of the worker that failed to start.
        worker: usize,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}
