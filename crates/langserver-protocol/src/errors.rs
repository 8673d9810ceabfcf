//! Error taxonomy shared by the session, routers and handlers.

use std::error::Error;
use std::io;

use thiserror::Error;

use crate::message::ResponseError;
use crate::method::Method;

/// Well-known JSON-RPC and LSP error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received.
    ParseError,
    /// The JSON sent is not a valid request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal error while handling the request.
    InternalError,
    /// A request arrived before `initialize` completed.
    ServerNotInitialized,
    /// Catch-all for unclassified failures.
    UnknownErrorCode,
    /// The request was cancelled by the client.
    RequestCancelled,
}

impl ErrorCode {
    /// Numeric value carried on the wire.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerNotInitialized => -32002,
            Self::UnknownErrorCode => -32001,
            Self::RequestCancelled => -32800,
        }
    }
}

/// Transport-layer errors. Fatal to the connection they occur on.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing Content-Length header.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// Invalid header format.
    #[error("invalid header format")]
    InvalidHeader,

    /// Declared frame size exceeds the limit.
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Declared size.
        size: usize,
        /// Maximum accepted size.
        max: usize,
    },

    /// The header block grew past the limit without a terminating blank line.
    #[error("header block exceeds the {max} byte limit")]
    HeaderTooLarge {
        /// Maximum accepted header block size.
        max: usize,
    },
}

/// Failure of an outbound request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The connection closed before a response arrived.
    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    /// The peer answered with an error object.
    #[error("peer returned error: {0}")]
    Remote(#[from] ResponseError),

    /// Parameters or result could not be (de)serialised.
    #[error("JSON codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Violations of the message protocol. Reported to the peer as error
/// responses; the connection stays open.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload was not valid JSON.
    #[error("failed to parse message: {source}")]
    Parse {
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The payload was not a request, response or notification.
    #[error("malformed message: {reason}")]
    Malformed {
        /// Which rule was violated.
        reason: &'static str,
    },

    /// No handler exists for the method.
    #[error("unhandled method {method}")]
    MethodNotFound {
        /// Method name as received.
        method: String,
    },

    /// Parameters did not decode into the method's parameter type.
    #[error("invalid params for {method}: {source}")]
    InvalidParams {
        /// Method being dispatched.
        method: Method,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// A request other than `initialize` arrived first.
    #[error("server not initialized; {method} must follow initialize")]
    NotInitialized {
        /// Method that arrived too early.
        method: Method,
    },

    /// `initialize` arrived on an initialised connection.
    #[error("initialize may only be sent once per connection")]
    AlreadyInitialized,

    /// A second `shutdown` arrived under the strict policy.
    #[error("shutdown was already requested")]
    DuplicateShutdown,

    /// A request arrived after `shutdown`.
    #[error("{method} is not allowed after shutdown")]
    AfterShutdown {
        /// Method that arrived too late.
        method: Method,
    },
}

impl ProtocolError {
    /// Builds a `MethodNotFound` error.
    #[must_use]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Error code reported on the wire.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => ErrorCode::ParseError,
            Self::Malformed { .. }
            | Self::AlreadyInitialized
            | Self::DuplicateShutdown
            | Self::AfterShutdown { .. } => ErrorCode::InvalidRequest,
            Self::MethodNotFound { .. } => ErrorCode::MethodNotFound,
            Self::InvalidParams { .. } => ErrorCode::InvalidParams,
            Self::NotInitialized { .. } => ErrorCode::ServerNotInitialized,
        }
    }
}

impl From<ProtocolError> for ResponseError {
    fn from(error: ProtocolError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

/// Failure reported by a handler implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    code: i64,
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl HandlerError {
    /// Builds an internal error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::InternalError.code(), message)
    }

    /// Builds an error carrying an explicit wire code.
    #[must_use]
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Builds an internal error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            code: ErrorCode::InternalError.code(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wire code reported to the peer.
    #[must_use]
    pub fn code(&self) -> i64 {
        self.code
    }

    /// Human-friendly description without the optional source.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl From<RequestError> for HandlerError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::Remote(remote) => Self::with_code(remote.code, remote.message),
            other => Self::with_source("request to client failed", other),
        }
    }
}

impl From<HandlerError> for ResponseError {
    fn from(error: HandlerError) -> Self {
        Self {
            code: error.code,
            message: error.message,
            data: None,
        }
    }
}

/// Error produced by a router for one request or notification.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The message violated the protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The handler failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl From<DispatchError> for ResponseError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Protocol(protocol) => protocol.into(),
            DispatchError::Handler(handler) => handler.into(),
        }
    }
}

/// Connection-level failure that ended a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The stream failed.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
    /// A session thread could not be started.
    #[error("failed to spawn session thread: {source}")]
    Spawn {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// A session thread panicked.
    #[error("session thread panicked")]
    Panicked,
}
