//! JSON-RPC 2.0 message model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::errors::{ErrorCode, ProtocolError};

/// Protocol version carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Identifier correlating a request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(formatter, "{id}"),
            Self::String(id) => write!(formatter, "{id:?}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::String(id.to_owned())
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message} (code: {code})")]
pub struct ResponseError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    /// Builds an error object with a well-known code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }
}

/// An inbound or outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Identifier the response must echo.
    pub id: RequestId,
    /// Method name on the wire.
    pub method: String,
    /// Parameters, `Value::Null` when absent.
    pub params: Value,
}

/// A one-way message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Method name on the wire.
    pub method: String,
    /// Parameters, `Value::Null` when absent.
    pub params: Value,
}

/// A reply to a request.
///
/// The identifier is `None` only when the peer could not determine which
/// request failed (parse errors).
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Identifier of the request being answered.
    pub id: Option<RequestId>,
    /// Result value or error object.
    pub outcome: Result<Value, ResponseError>,
}

impl Response {
    /// Builds a success response.
    #[must_use]
    pub fn ok(id: RequestId, result: Value) -> Self {
        Self {
            id: Some(id),
            outcome: Ok(result),
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(id: Option<RequestId>, error: ResponseError) -> Self {
        Self {
            id,
            outcome: Err(error),
        }
    }
}

/// Any message exchanged on a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A request expecting a response.
    Request(Request),
    /// A response to an earlier request.
    Response(Response),
    /// A notification.
    Notification(Notification),
}

/// Reasons a frame could not be turned into a [`Message`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not valid JSON.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload was JSON but not a request, response or notification.
    #[error("{reason}")]
    Shape {
        /// Identifier recovered from the payload, if any.
        id: Option<RequestId>,
        /// Which rule was violated.
        reason: &'static str,
    },
}

impl DecodeError {
    /// Identifier to echo in the error response, when one was recoverable.
    #[must_use]
    pub fn id(&self) -> Option<RequestId> {
        match self {
            Self::Json(_) => None,
            Self::Shape { id, .. } => id.clone(),
        }
    }

    /// Converts the failure into the protocol error reported to the peer.
    #[must_use]
    pub fn into_protocol_error(self) -> ProtocolError {
        match self {
            Self::Json(source) => ProtocolError::Parse { source },
            Self::Shape { reason, .. } => ProtocolError::Malformed { reason },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ResponseError>,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    jsonrpc: &'static str,
    id: &'a RequestId,
    method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    params: &'a Value,
}

#[derive(Serialize)]
struct WireNotification<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    params: &'a Value,
}

#[derive(Serialize)]
struct WireResponse<'a> {
    jsonrpc: &'static str,
    id: &'a Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ResponseError>,
}

impl Message {
    /// Decodes one framed payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] for invalid JSON and
    /// [`DecodeError::Shape`] when the object is not a valid message.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let wire: WireMessage = serde_json::from_slice(bytes)?;
        if wire
            .jsonrpc
            .as_deref()
            .is_some_and(|version| version != JSONRPC_VERSION)
        {
            return Err(DecodeError::Shape {
                id: wire.id,
                reason: "unsupported jsonrpc version",
            });
        }

        match (wire.method, wire.id) {
            (Some(method), Some(id)) => Ok(Self::Request(Request {
                id,
                method,
                params: wire.params.unwrap_or(Value::Null),
            })),
            (Some(method), None) => Ok(Self::Notification(Notification {
                method,
                params: wire.params.unwrap_or(Value::Null),
            })),
            (None, id) => match wire.error {
                Some(error) => Ok(Self::Response(Response::error(id, error))),
                None if wire.result.is_some() || id.is_some() => {
                    let Some(id) = id else {
                        return Err(DecodeError::Shape {
                            id: None,
                            reason: "response without an id",
                        });
                    };
                    Ok(Self::Response(Response::ok(
                        id,
                        wire.result.unwrap_or(Value::Null),
                    )))
                }
                None => Err(DecodeError::Shape {
                    id: None,
                    reason: "message has neither a method nor an id",
                }),
            },
        }
    }

    /// Encodes the message as a JSON payload.
    ///
    /// # Errors
    ///
    /// Propagates serialisation failures from `serde_json`.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Request(request) => serde_json::to_vec(&WireRequest {
                jsonrpc: JSONRPC_VERSION,
                id: &request.id,
                method: &request.method,
                params: &request.params,
            }),
            Self::Notification(notification) => serde_json::to_vec(&WireNotification {
                jsonrpc: JSONRPC_VERSION,
                method: &notification.method,
                params: &notification.params,
            }),
            Self::Response(response) => serde_json::to_vec(&WireResponse {
                jsonrpc: JSONRPC_VERSION,
                id: &response.id,
                result: response.outcome.as_ref().ok(),
                error: response.outcome.as_ref().err(),
            }),
        }
    }

    /// Method name, when the message has one.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(request) => Some(request.method.as_str()),
            Self::Notification(notification) => Some(notification.method.as_str()),
            Self::Response(_) => None,
        }
    }
}
