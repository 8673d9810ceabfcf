//! Supervises daemon launch sequencing and runtime orchestration.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with};
use crate::cluster::{Cluster, ClusterOptions, HandlerFactory};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::placeholder_handler::PlaceholderHandler;
use crate::transport::{ConnectionHandler, ListenerHandle, TcpSocketListener};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

impl Daemon {
    /// Binds the listener, starts every worker and then begins accepting.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Listener`] when the address cannot be bound and
    /// [`LaunchError::Cluster`] when the workers cannot be started.
    pub fn start<F: HandlerFactory>(&self, factory: F) -> Result<DaemonHandle, LaunchError> {
        let config = self.config();
        let listener = TcpSocketListener::bind(config.host(), config.port())?;
        let cluster = Arc::new(Cluster::start(
            config.cluster_size().get(),
            factory,
            ClusterOptions::from_config(config),
            self.reporter(),
        )?);
        let handler: Arc<dyn ConnectionHandler> = Arc::clone(&cluster) as Arc<dyn ConnectionHandler>;
        let listener = listener.start(handler)?;
        self.reporter().listener_ready(listener.local_addr());
        Ok(DaemonHandle { listener, cluster })
    }
}

/// A running daemon: the accept loop plus its worker pool.
pub struct DaemonHandle {
    listener: ListenerHandle,
    cluster: Arc<Cluster>,
}

impl DaemonHandle {
    /// Address clients connect to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// The worker pool behind the listener.
    #[must_use]
    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Stops accepting, then stops every worker and closes its sessions.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Listener`] when the accept thread panicked; the
    /// workers are stopped regardless.
    pub fn shutdown(self) -> Result<(), LaunchError> {
        let Self { listener, cluster } = self;
        listener.shutdown();
        let joined = listener.join();
        cluster.shutdown();
        joined?;
        info!(
            target: PROCESS_TARGET,
            "shutdown sequence completed"
        );
        Ok(())
    }
}

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// See [`run_daemon_with`].
pub fn run_daemon() -> Result<(), LaunchError> {
    let reporter = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(
        &SystemConfigLoader,
        reporter,
        PlaceholderHandler::new,
        &SystemShutdownSignal,
    )
}

/// Runs the daemon with injected collaborators until `shutdown` fires.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, startup or the shutdown wait
/// fail. A started daemon is always torn down before returning.
pub fn run_daemon_with<F, S>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    factory: F,
    shutdown: &S,
) -> Result<(), LaunchError>
where
    F: HandlerFactory,
    S: ShutdownSignal + ?Sized,
{
    let daemon = bootstrap_with(loader, reporter)?;
    let handle = daemon.start(factory)?;
    info!(
        target: PROCESS_TARGET,
        address = %handle.local_addr(),
        "daemon running"
    );
    let waited = shutdown.wait();
    handle.shutdown()?;
    waited?;
    Ok(())
}
