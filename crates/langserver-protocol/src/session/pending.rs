//! Table of outbound requests awaiting a response.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use serde_json::Value;

use crate::errors::RequestError;
use crate::message::RequestId;

type Outcome = Result<Value, RequestError>;

/// Result of an outbound request that has not necessarily arrived yet.
///
/// Waiting blocks only the calling thread.
#[derive(Debug)]
pub struct PendingResponse {
    id: RequestId,
    receiver: Receiver<Outcome>,
}

impl PendingResponse {
    /// Identifier of the request on the wire.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Blocks until the response arrives or the connection closes.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Remote` when the peer answered with an error
    /// and `RequestError::ConnectionClosed` when no answer will arrive.
    pub fn wait(self) -> Result<Value, RequestError> {
        self.receiver
            .recv()
            .unwrap_or(Err(RequestError::ConnectionClosed))
    }

    /// Waits up to `timeout` for the response.
    ///
    /// Hands the pending response back when the deadline passes so the
    /// caller may keep waiting or drop it.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` when the timeout elapsed first.
    pub fn wait_timeout(self, timeout: Duration) -> Result<Result<Value, RequestError>, Self> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Ok(outcome),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(RequestError::ConnectionClosed)),
            Err(RecvTimeoutError::Timeout) => Err(self),
        }
    }
}

/// Per-connection map from request identifier to its result channel.
///
/// Every entry is resolved at most once: it is removed from the map before
/// its channel is fulfilled.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    entries: HashMap<RequestId, Sender<Outcome>>,
    closed: bool,
}

impl PendingTable {
    pub(crate) fn register(&mut self, id: RequestId) -> Result<PendingResponse, RequestError> {
        if self.closed {
            return Err(RequestError::ConnectionClosed);
        }
        let (sender, receiver) = mpsc::channel();
        self.entries.insert(id.clone(), sender);
        Ok(PendingResponse { id, receiver })
    }

    /// Resolves the entry for `id`. Returns `false` when no entry exists.
    pub(crate) fn complete(&mut self, id: &RequestId, outcome: Outcome) -> bool {
        let Some(sender) = self.entries.remove(id) else {
            return false;
        };
        // The caller may have dropped its PendingResponse.
        let _ = sender.send(outcome);
        true
    }

    pub(crate) fn forget(&mut self, id: &RequestId) {
        self.entries.remove(id);
    }

    /// Fails every entry with `ConnectionClosed` and refuses new ones.
    pub(crate) fn close(&mut self) -> usize {
        self.closed = true;
        let failed = self.entries.len();
        for (_, sender) in self.entries.drain() {
            let _ = sender.send(Err(RequestError::ConnectionClosed));
        }
        failed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
