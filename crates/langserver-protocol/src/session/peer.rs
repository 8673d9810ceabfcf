//! Outbound half of a connection, shared by the session and its handler.

use std::fmt;
use std::io::{self, BufWriter};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lsp_types::TextDocumentIdentifier;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::pending::{PendingResponse, PendingTable};
use super::{SESSION_TARGET, TRACE_TARGET};
use crate::connection::ConnectionStream;
use crate::errors::{RequestError, TransportError};
use crate::framing::MessageWriter;
use crate::message::{Message, Notification, Request, RequestId, Response};
use crate::method::Method;
use crate::types::{TextDocumentContent, WorkspaceFilesParams};

type FrameWriter = MessageWriter<BufWriter<ConnectionStream>>;

/// Handle for sending messages to the remote end of a connection.
///
/// Cloning is cheap; all clones share one writer and one pending request
/// table.
#[derive(Clone)]
pub struct Peer {
    inner: Arc<PeerInner>,
}

struct PeerInner {
    label: String,
    trace: bool,
    writer: Mutex<Option<FrameWriter>>,
    pending: Mutex<PendingTable>,
    next_id: AtomicI64,
    control: ConnectionStream,
    closed: AtomicBool,
}

impl fmt::Debug for Peer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Peer")
            .field("label", &self.inner.label)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Peer {
    pub(crate) fn new(
        writer: ConnectionStream,
        control: ConnectionStream,
        label: String,
        trace: bool,
    ) -> Self {
        Self {
            inner: Arc::new(PeerInner {
                label,
                trace,
                writer: Mutex::new(Some(MessageWriter::new(BufWriter::new(writer)))),
                pending: Mutex::new(PendingTable::default()),
                next_id: AtomicI64::new(1),
                control,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Name of the connection in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Whether [`Peer::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Sends a request and returns a handle to its eventual result.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::ConnectionClosed` when the connection is closed
    /// or the write fails, and `RequestError::Codec` when the request cannot
    /// be serialised.
    pub fn send(
        &self,
        method: impl AsRef<str>,
        params: Value,
    ) -> Result<PendingResponse, RequestError> {
        let id = RequestId::Number(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let pending = self.pending().register(id.clone())?;
        let message = Message::Request(Request {
            id: id.clone(),
            method: method.as_ref().to_owned(),
            params,
        });
        let payload = match message.to_vec() {
            Ok(payload) => payload,
            Err(error) => {
                self.pending().forget(&id);
                return Err(RequestError::Codec(error));
            }
        };

        match self.write_payload(&payload) {
            Ok(()) => Ok(pending),
            Err(error) => {
                warn!(
                    target: SESSION_TARGET,
                    connection = %self.inner.label,
                    error = %error,
                    "request write failed; closing connection"
                );
                self.close();
                Err(RequestError::ConnectionClosed)
            }
        }
    }

    /// Sends a notification. Nothing is tracked.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::ConnectionClosed` when the connection is closed
    /// or the write fails.
    pub fn notify(&self, method: impl AsRef<str>, params: Value) -> Result<(), RequestError> {
        let message = Message::Notification(Notification {
            method: method.as_ref().to_owned(),
            params,
        });
        self.write(&message).map_err(|error| {
            debug!(
                target: SESSION_TARGET,
                connection = %self.inner.label,
                error = %error,
                "notification not delivered"
            );
            RequestError::ConnectionClosed
        })
    }

    /// Sends a typed request and waits for its decoded result.
    ///
    /// # Errors
    ///
    /// Returns any [`RequestError`] raised while sending, waiting or
    /// decoding.
    pub fn request<P, R>(&self, method: Method, params: &P) -> Result<R, RequestError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)?;
        let result = self.send(method, params)?.wait()?;
        Ok(serde_json::from_value(result)?)
    }

    /// Asks the client for the files below `params.base`.
    ///
    /// # Errors
    ///
    /// See [`Peer::request`].
    pub fn workspace_files(
        &self,
        params: &WorkspaceFilesParams,
    ) -> Result<Vec<TextDocumentIdentifier>, RequestError> {
        self.request(Method::WorkspaceFiles, params)
    }

    /// Asks the client for the text of one document.
    ///
    /// # Errors
    ///
    /// See [`Peer::request`].
    pub fn text_document_content(
        &self,
        document: &TextDocumentIdentifier,
    ) -> Result<TextDocumentContent, RequestError> {
        self.request(Method::TextDocumentContent, document)
    }

    /// Stops further writes, fails every pending request with
    /// `ConnectionClosed` and shuts the stream down. Idempotent.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(error) = self.inner.control.shutdown() {
            debug!(
                target: SESSION_TARGET,
                connection = %self.inner.label,
                error = %error,
                "stream shutdown failed"
            );
        }
        let failed = self.fail_pending();
        drop(
            self.inner
                .writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        debug!(
            target: SESSION_TARGET,
            connection = %self.inner.label,
            failed,
            "connection closed"
        );
    }

    pub(crate) fn fail_pending(&self) -> usize {
        self.pending().close()
    }

    pub(crate) fn complete(&self, response: Response) {
        let Some(id) = response.id else {
            warn!(
                target: SESSION_TARGET,
                connection = %self.inner.label,
                "discarding response without an id"
            );
            return;
        };
        let outcome = response.outcome.map_err(RequestError::Remote);
        if !self.pending().complete(&id, outcome) {
            warn!(
                target: SESSION_TARGET,
                connection = %self.inner.label,
                id = %id,
                "discarding response to unknown request"
            );
        }
    }

    pub(crate) fn respond(&self, response: Response) -> Result<(), TransportError> {
        self.write(&Message::Response(response))
    }

    pub(crate) fn trace_inbound(&self, payload: &[u8]) {
        if self.inner.trace {
            info!(
                target: TRACE_TARGET,
                connection = %self.inner.label,
                direction = "inbound",
                payload = %String::from_utf8_lossy(payload),
                "frame"
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> MutexGuard<'_, PendingTable> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, message: &Message) -> Result<(), TransportError> {
        let payload = message
            .to_vec()
            .map_err(|error| TransportError::Io(io::Error::new(io::ErrorKind::InvalidData, error)))?;
        self.write_payload(&payload)
    }

    fn write_payload(&self, payload: &[u8]) -> Result<(), TransportError> {
        let mut guard = self
            .inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let writer = guard.as_mut().ok_or_else(|| {
            TransportError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection closed",
            ))
        })?;
        if self.inner.trace {
            info!(
                target: TRACE_TARGET,
                connection = %self.inner.label,
                direction = "outbound",
                payload = %String::from_utf8_lossy(payload),
                "frame"
            );
        }
        writer.write_frame(payload)
    }
}
