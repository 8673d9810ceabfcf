//! A worker thread and the sessions it hosts.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use langserver_protocol::{ConnectionStream, Session, SessionError, SessionHandle, SessionOptions};
use tracing::{debug, warn};

use super::{CLUSTER_TARGET, ClusterError, ClusterOptions, HandlerFactory, SessionContext};
use crate::health::HealthReporter;

const REAP_INTERVAL: Duration = Duration::from_millis(200);

/// Dispatcher-side handle to one worker thread.
pub(crate) struct Worker {
    index: usize,
    inbox: Mutex<Option<Sender<ConnectionStream>>>,
    alive: Arc<AtomicBool>,
    assigned: AtomicUsize,
    hosted: Arc<AtomicUsize>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    pub(crate) fn spawn<F: HandlerFactory>(
        index: usize,
        factory: Arc<F>,
        options: ClusterOptions,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<Self, ClusterError> {
        let (sender, receiver) = mpsc::channel();
        let alive = Arc::new(AtomicBool::new(true));
        let hosted = Arc::new(AtomicUsize::new(0));
        let host = SessionHost {
            index,
            factory,
            options,
            sessions: HostedSessions {
                index,
                alive: Arc::clone(&alive),
                reporter,
                hosted: Arc::clone(&hosted),
                handles: Vec::new(),
            },
            accepted: 0,
        };
        let thread = thread::Builder::new()
            .name(format!("langserverd-worker-{index}"))
            .spawn(move || host.run(&receiver))
            .map_err(|source| ClusterError::Spawn {
                worker: index,
                source,
            })?;
        Ok(Self {
            index,
            inbox: Mutex::new(Some(sender)),
            alive,
            assigned: AtomicUsize::new(0),
            hosted,
            thread: Mutex::new(Some(thread)),
        })
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub(crate) fn assigned(&self) -> usize {
        self.assigned.load(Ordering::SeqCst)
    }

    /// Sessions the worker holds, including finished ones not yet reaped.
    pub(crate) fn hosted(&self) -> usize {
        self.hosted.load(Ordering::SeqCst)
    }

    /// Queues `stream` on this worker, or hands it back when the worker has
    /// stopped or been lost.
    pub(crate) fn assign(&self, stream: ConnectionStream) -> Result<(), ConnectionStream> {
        if !self.is_alive() {
            return Err(stream);
        }
        let inbox = self.inbox.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = inbox.as_ref() else {
            return Err(stream);
        };
        match sender.send(stream) {
            Ok(()) => {
                self.assigned.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(mpsc::SendError(stream)) => {
                self.alive.store(false, Ordering::SeqCst);
                Err(stream)
            }
        }
    }

    /// Closes the inbox; the worker closes its sessions and exits.
    pub(crate) fn stop(&self) {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Waits for the worker thread; returns `false` if it panicked.
    pub(crate) fn join(&self) -> bool {
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        handle.is_none_or(|handle| handle.join().is_ok())
    }
}

/// State owned by the worker thread.
struct SessionHost<F> {
    index: usize,
    factory: Arc<F>,
    options: ClusterOptions,
    sessions: HostedSessions,
    accepted: usize,
}

impl<F: HandlerFactory> SessionHost<F> {
    fn run(mut self, receiver: &Receiver<ConnectionStream>) {
        debug!(target: CLUSTER_TARGET, worker = self.index, "worker started");
        loop {
            match receiver.recv_timeout(REAP_INTERVAL) {
                Ok(stream) => {
                    self.sessions.reap();
                    self.accept(stream);
                }
                Err(RecvTimeoutError::Timeout) => self.sessions.reap(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!(target: CLUSTER_TARGET, worker = self.index, "worker stopping");
    }

    fn accept(&mut self, stream: ConnectionStream) {
        self.accepted += 1;
        let label = format!("worker{}-{}", self.index, self.accepted);
        let peer = stream.peer_label();
        match self.serve(stream, label.clone()) {
            Ok(handle) => {
                debug!(
                    target: CLUSTER_TARGET,
                    worker = self.index,
                    connection = %label,
                    peer = %peer,
                    "session opened"
                );
                self.sessions.push(handle);
            }
            Err(error) => warn!(
                target: CLUSTER_TARGET,
                worker = self.index,
                connection = %label,
                error = %error,
                "failed to open session"
            ),
        }
    }

    fn serve(&self, stream: ConnectionStream, label: String) -> Result<SessionHandle, SessionError> {
        let options = SessionOptions {
            label: label.clone(),
            trace: self.options.trace,
            shutdown: self.options.shutdown_policy(),
        };
        Session::language(stream, options, |client| {
            self.factory.create(SessionContext {
                worker: self.index,
                label,
                strict: self.options.strict,
                client,
            })
        })?
        .spawn()
    }
}

/// Sessions hosted by one worker. Dropping the set, including while the
/// worker unwinds from a panic, marks the worker dead and closes every
/// session.
struct HostedSessions {
    index: usize,
    alive: Arc<AtomicBool>,
    reporter: Arc<dyn HealthReporter>,
    hosted: Arc<AtomicUsize>,
    handles: Vec<SessionHandle>,
}

impl HostedSessions {
    fn push(&mut self, handle: SessionHandle) {
        self.handles.push(handle);
        self.hosted.store(self.handles.len(), Ordering::SeqCst);
    }

    /// Joins sessions that have ended.
    fn reap(&mut self) {
        if !self.handles.iter().any(SessionHandle::is_finished) {
            return;
        }
        let (finished, running): (Vec<_>, Vec<_>) = self
            .handles
            .drain(..)
            .partition(SessionHandle::is_finished);
        self.handles = running;
        self.hosted.store(self.handles.len(), Ordering::SeqCst);
        for handle in finished {
            log_outcome(self.index, handle);
        }
    }
}

impl Drop for HostedSessions {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if thread::panicking() {
            self.reporter.worker_lost(self.index, self.handles.len());
        }
        for handle in &self.handles {
            handle.close();
        }
        for handle in self.handles.drain(..) {
            log_outcome(self.index, handle);
        }
        self.hosted.store(0, Ordering::SeqCst);
    }
}

fn log_outcome(worker: usize, handle: SessionHandle) {
    let connection = handle.peer().label().to_owned();
    match handle.join() {
        Ok(end) => debug!(
            target: CLUSTER_TARGET,
            worker,
            connection = %connection,
            end = ?end,
            "session closed"
        ),
        Err(error) => warn!(
            target: CLUSTER_TARGET,
            worker,
            connection = %connection,
            error = %error,
            "session failed"
        ),
    }
}
