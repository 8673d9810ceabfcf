//! Per-connection protocol session.
//!
//! A session owns one [`ConnectionStream`]. A reader thread turns frames into
//! messages: responses complete entries in the pending request table
//! straight away, while requests and notifications are queued in arrival
//! order to the dispatch loop, which calls the [`Router`] one message at a
//! time. Because responses never wait behind the dispatch loop, a handler can
//! block on a request it sent to the peer.

mod peer;
mod pending;

use std::any::Any;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

pub use self::peer::Peer;
pub use self::pending::PendingResponse;
use crate::connection::ConnectionStream;
use crate::errors::{DispatchError, HandlerError, ProtocolError, SessionError, TransportError};
use crate::framing::MessageReader;
use crate::handler::LanguageHandler;
use crate::message::{DecodeError, Message, Notification, Request, Response, ResponseError};
use crate::method::Method;
use crate::router::{Flow, LanguageRouter, Router, ShutdownPolicy};

pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::session");
pub(crate) const TRACE_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::trace");

/// Settings applied to one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Name of the connection in logs and thread names.
    pub label: String,
    /// Log every inbound and outbound payload.
    pub trace: bool,
    /// Handling of repeated `shutdown` requests.
    pub shutdown: ShutdownPolicy,
}

impl SessionOptions {
    /// Options with the given label and defaults otherwise.
    #[must_use]
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// How a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer completed the `exit` handshake.
    Exited,
    /// The stream ended without `exit`.
    Disconnected,
}

enum Inbound {
    Request(Request),
    Notification(Notification),
    Malformed(DecodeError),
}

/// A protocol session bound to one connection.
pub struct Session<R> {
    peer: Peer,
    router: R,
    reader: MessageReader<BufReader<ConnectionStream>>,
    label: String,
}

impl<R: Router + 'static> Session<R> {
    /// Creates a session over `stream`.
    ///
    /// `build` receives the session's [`Peer`] so the router and its handler
    /// can issue requests to the remote end.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transport` if the stream cannot be duplicated.
    pub fn new<F>(
        stream: ConnectionStream,
        options: SessionOptions,
        build: F,
    ) -> Result<Self, SessionError>
    where
        F: FnOnce(Peer) -> R,
    {
        let writer = stream.try_clone().map_err(TransportError::from)?;
        let control = stream.try_clone().map_err(TransportError::from)?;
        let peer = Peer::new(writer, control, options.label.clone(), options.trace);
        let router = build(peer.clone());
        Ok(Self {
            peer,
            router,
            reader: MessageReader::new(BufReader::new(stream)),
            label: options.label,
        })
    }

    /// Handle for sending messages on this session's connection.
    #[must_use]
    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    /// Runs the session until `exit`, end of stream or a transport failure.
    ///
    /// The peer is closed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transport` when the stream fails,
    /// `SessionError::Spawn` when the reader thread cannot start and
    /// `SessionError::Panicked` when it panics.
    pub fn run(self) -> Result<SessionEnd, SessionError> {
        let Self {
            peer,
            mut router,
            reader,
            label,
        } = self;
        let _guard = CloseOnDrop(peer.clone());
        let (inbox, queue) = mpsc::channel();

        let reader_peer = peer.clone();
        let reader_thread = thread::Builder::new()
            .name(format!("{label}-reader"))
            .spawn(move || read_loop(reader, &reader_peer, &inbox))
            .map_err(|source| SessionError::Spawn { source })?;

        debug!(target: SESSION_TARGET, connection = %label, "session started");
        let flow = dispatch_loop(&peer, &mut router, &queue);
        peer.close();

        let read_result = reader_thread.join().map_err(|_| SessionError::Panicked)?;
        let end = match flow {
            Flow::Exit => SessionEnd::Exited,
            Flow::Continue => {
                read_result?;
                SessionEnd::Disconnected
            }
        };
        debug!(
            target: SESSION_TARGET,
            connection = %label,
            end = ?end,
            "session finished"
        );
        Ok(end)
    }

    /// Runs the session on a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Spawn` when the thread cannot start.
    pub fn spawn(self) -> Result<SessionHandle, SessionError> {
        let peer = self.peer.clone();
        let thread = thread::Builder::new()
            .name(format!("{}-session", self.label))
            .spawn(move || self.run())
            .map_err(|source| SessionError::Spawn { source })?;
        Ok(SessionHandle { peer, thread })
    }
}

impl<H: LanguageHandler + 'static> Session<LanguageRouter<H>> {
    /// Creates a session that serves `handler` behind a [`LanguageRouter`]
    /// using the shutdown policy from `options`.
    ///
    /// # Errors
    ///
    /// See [`Session::new`].
    pub fn language<F>(
        stream: ConnectionStream,
        options: SessionOptions,
        handler: F,
    ) -> Result<Self, SessionError>
    where
        F: FnOnce(Peer) -> H,
    {
        let policy = options.shutdown;
        Self::new(stream, options, |peer| {
            LanguageRouter::with_policy(handler(peer), policy)
        })
    }
}

/// Handle to a session running on its own thread.
#[derive(Debug)]
pub struct SessionHandle {
    peer: Peer,
    thread: JoinHandle<Result<SessionEnd, SessionError>>,
}

impl SessionHandle {
    /// Handle for sending messages on the session's connection.
    #[must_use]
    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    /// Closes the connection; the session thread finishes shortly after.
    pub fn close(&self) {
        self.peer.close();
    }

    /// Whether the session thread has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the session thread.
    ///
    /// # Errors
    ///
    /// Returns the session's own error, or `SessionError::Panicked`.
    pub fn join(self) -> Result<SessionEnd, SessionError> {
        self.thread.join().map_err(|_| SessionError::Panicked)?
    }
}

struct CloseOnDrop(Peer);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn read_loop(
    mut reader: MessageReader<BufReader<ConnectionStream>>,
    peer: &Peer,
    inbox: &Sender<Inbound>,
) -> Result<(), TransportError> {
    let result = loop {
        let frame = match reader.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break Ok(()),
            Err(_) if peer.is_closed() => break Ok(()),
            Err(error) => break Err(error),
        };
        peer.trace_inbound(&frame);

        let inbound = match Message::from_slice(&frame) {
            Ok(Message::Response(response)) => {
                peer.complete(response);
                continue;
            }
            Ok(Message::Request(request)) => Inbound::Request(request),
            Ok(Message::Notification(notification)) => Inbound::Notification(notification),
            Err(error) => Inbound::Malformed(error),
        };
        if inbox.send(inbound).is_err() {
            break Ok(());
        }
    };

    let failed = peer.fail_pending();
    if failed > 0 {
        debug!(
            target: SESSION_TARGET,
            connection = %peer.label(),
            failed,
            "failed pending requests at end of stream"
        );
    }
    result
}

fn dispatch_loop<R: Router>(peer: &Peer, router: &mut R, queue: &Receiver<Inbound>) -> Flow {
    for inbound in queue {
        let response = match inbound {
            Inbound::Request(request) => dispatch_request(peer, router, request),
            Inbound::Notification(notification) => {
                if dispatch_notification(peer, router, notification) == Flow::Exit {
                    return Flow::Exit;
                }
                continue;
            }
            Inbound::Malformed(error) => {
                warn!(
                    target: SESSION_TARGET,
                    connection = %peer.label(),
                    error = %error,
                    "malformed message"
                );
                let id = error.id();
                Response::error(id, error.into_protocol_error().into())
            }
        };

        if let Err(error) = peer.respond(response) {
            warn!(
                target: SESSION_TARGET,
                connection = %peer.label(),
                error = %error,
                "failed to write response"
            );
            break;
        }
    }
    Flow::Continue
}

fn dispatch_request<R: Router>(peer: &Peer, router: &mut R, request: Request) -> Response {
    let Request { id, method, params } = request;
    let outcome = match Method::from_str(&method) {
        Ok(known) => contain_panic(peer, known, || router.handle_request(known, params))
            .map_err(|error| {
                debug!(
                    target: SESSION_TARGET,
                    connection = %peer.label(),
                    method = known.as_str(),
                    error = %error,
                    "request failed"
                );
                ResponseError::from(error)
            }),
        Err(_) => {
            info!(
                target: SESSION_TARGET,
                connection = %peer.label(),
                method = %method,
                "unhandled request method"
            );
            Err(ProtocolError::method_not_found(method).into())
        }
    };
    Response {
        id: Some(id),
        outcome,
    }
}

fn dispatch_notification<R: Router>(
    peer: &Peer,
    router: &mut R,
    notification: Notification,
) -> Flow {
    let Ok(method) = Method::from_str(&notification.method) else {
        debug!(
            target: SESSION_TARGET,
            connection = %peer.label(),
            method = %notification.method,
            "ignoring unknown notification"
        );
        return Flow::Continue;
    };

    match contain_panic(peer, method, || {
        router.handle_notification(method, notification.params)
    }) {
        Ok(flow) => flow,
        Err(error) => {
            warn!(
                target: SESSION_TARGET,
                connection = %peer.label(),
                method = method.as_str(),
                error = %error,
                "notification failed"
            );
            Flow::Continue
        }
    }
}

/// Runs one router call, reporting a panic as an `InternalError` so the
/// session keeps serving later messages.
fn contain_panic<T>(
    peer: &Peer,
    method: Method,
    call: impl FnOnce() -> Result<T, DispatchError>,
) -> Result<T, DispatchError> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        let reason = panic_reason(payload.as_ref());
        warn!(
            target: SESSION_TARGET,
            connection = %peer.label(),
            method = method.as_str(),
            reason,
            "handler panicked"
        );
        Err(HandlerError::new(format!("{} handler panicked: {reason}", method.as_str())).into())
    })
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
