//! BDD test world: loader, reporter, factory and the running daemon shared by
//! step functions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use langserver_protocol::RequestError;
use rstest::fixture;
use serde_json::Value;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};
use crate::process::DaemonHandle;

use super::client::Client;
use super::config_loader::{FailingConfigLoader, loopback_loader};
use super::factory::TrapFactory;
use super::reporter::{HealthEvent, RecordingHealthReporter};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Scenario world shared across BDD steps.
pub struct DaemonWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    pub factory: TrapFactory,
    daemon: Option<Daemon>,
    bootstrap_error: Option<BootstrapError>,
    handle: Option<DaemonHandle>,
    clients: HashMap<String, Client>,
    raw: Vec<TcpStream>,
    results: Vec<Result<Value, RequestError>>,
}

impl DaemonWorld {
    /// Builds a world with a single-worker loopback configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: Box::new(loopback_loader(1, false)),
            reporter: Arc::new(RecordingHealthReporter::default()),
            factory: TrapFactory::default(),
            daemon: None,
            bootstrap_error: None,
            handle: None,
            clients: HashMap::new(),
            raw: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Installs a loader for `workers` workers on an ephemeral port.
    pub fn use_loopback_loader(&mut self, workers: usize, strict: bool) {
        self.loader = Box::new(loopback_loader(workers, strict));
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone()) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Bootstraps if needed and starts the listener and workers.
    pub fn start(&mut self) {
        self.bootstrap();
        let daemon = self.daemon.as_ref().expect("bootstrap should succeed");
        let handle = daemon
            .start(self.factory.clone())
            .expect("daemon should start");
        self.handle = Some(handle);
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns true when bootstrap produced a daemon.
    #[must_use]
    pub fn daemon_bootstrapped(&self) -> bool {
        self.daemon.is_some()
    }

    /// The running daemon.
    pub fn handle(&self) -> &DaemonHandle {
        self.handle.as_ref().expect("daemon should be running")
    }

    /// Opens `count` bare TCP connections.
    pub fn open_raw(&mut self, count: usize) {
        let addr = self.handle().local_addr();
        for _ in 0..count {
            self.raw
                .push(TcpStream::connect(addr).expect("connect raw client"));
        }
    }

    /// Connects a protocol client under `name`.
    pub fn connect(&mut self, name: &str) {
        let client = Client::connect(self.handle().local_addr());
        self.clients.insert(name.to_owned(), client);
    }

    /// The client registered under `name`.
    pub fn client(&self, name: &str) -> &Client {
        self.clients
            .get(name)
            .unwrap_or_else(|| panic!("no client named {name}"))
    }

    /// Records the outcome of a client request.
    pub fn record(&mut self, result: Result<Value, RequestError>) {
        self.results.push(result);
    }

    /// Outcome of the most recent request.
    pub fn last(&self) -> &Result<Value, RequestError> {
        self.results.last().expect("a request should have been sent")
    }

    /// Waits until the cluster has assigned `total` connections.
    pub fn wait_for_assignments(&self, total: usize) -> Vec<usize> {
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        loop {
            let assignments = self.handle().cluster().assignments();
            if assignments.iter().sum::<usize>() >= total || Instant::now() >= deadline {
                return assignments;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Waits until the reporter has recorded the loss of `worker`.
    pub fn wait_for_lost_worker(&self, worker: usize) -> bool {
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        while Instant::now() < deadline {
            let lost = self.reporter.events().into_iter().any(|event| {
                matches!(event, HealthEvent::WorkerLost { worker: lost, .. } if lost == worker)
            });
            if lost {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

impl Default for DaemonWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DaemonWorld {
    fn drop(&mut self) {
        self.clients.clear();
        self.raw.clear();
        if let Some(handle) = self.handle.take() {
            let _ = handle.shutdown();
        }
    }
}

/// Fresh world for each scenario.
#[fixture]
pub fn world() -> RefCell<DaemonWorld> {
    RefCell::new(DaemonWorld::new())
}
