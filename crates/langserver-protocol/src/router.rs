//! Method routing and connection lifecycle enforcement.
//!
//! A router receives already-classified messages from the session's dispatch
//! loop, decodes their parameters, calls into a handler and encodes the
//! result. [`LanguageRouter`] serves the analysis methods on the server side
//! of a connection; [`FileRouter`] serves role-reversed file requests on the
//! client side.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::errors::{DispatchError, HandlerError, ProtocolError};
use crate::handler::{LanguageHandler, WorkspaceFileProvider};
use crate::method::Method;
use crate::types::WorkspaceReferenceParams;

const ROUTER_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::router");

/// Whether the session keeps running after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading messages.
    Continue,
    /// Close the connection.
    Exit,
}

/// Behaviour when `shutdown` arrives more than once on a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Answer repeated requests with success without calling the handler.
    #[default]
    Idempotent,
    /// Answer repeated requests with `InvalidRequest`.
    Strict,
}

/// Destination of inbound requests and notifications for one connection.
pub trait Router: Send {
    /// Handles a request and returns its encoded result.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] which the session reports to the peer as
    /// an error response.
    fn handle_request(&mut self, method: Method, params: Value) -> Result<Value, DispatchError>;

    /// Handles a notification.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] which the session logs; notifications are
    /// never answered.
    fn handle_notification(&mut self, method: Method, params: Value)
    -> Result<Flow, DispatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Ready,
    ShutDown,
}

/// Routes analysis methods to a [`LanguageHandler`] and enforces the
/// `initialize` / `shutdown` / `exit` lifecycle.
#[derive(Debug)]
pub struct LanguageRouter<H> {
    handler: H,
    state: Lifecycle,
    policy: ShutdownPolicy,
}

impl<H: LanguageHandler> LanguageRouter<H> {
    /// Wraps a handler with the default shutdown policy.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self::with_policy(handler, ShutdownPolicy::default())
    }

    /// Wraps a handler with an explicit shutdown policy.
    #[must_use]
    pub fn with_policy(handler: H, policy: ShutdownPolicy) -> Self {
        Self {
            handler,
            state: Lifecycle::Uninitialized,
            policy,
        }
    }

    /// Borrows the wrapped handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Whether `initialize` has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state != Lifecycle::Uninitialized
    }

    fn check_ready(&self, method: Method) -> Result<(), ProtocolError> {
        match self.state {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Uninitialized => Err(ProtocolError::NotInitialized { method }),
            Lifecycle::ShutDown => Err(ProtocolError::AfterShutdown { method }),
        }
    }

    fn initialize(&mut self, params: Value) -> Result<Value, DispatchError> {
        if self.state != Lifecycle::Uninitialized {
            return Err(ProtocolError::AlreadyInitialized.into());
        }
        let result = self
            .handler
            .initialize(decode(Method::Initialize, params)?)?;
        let encoded = encode(&result)?;
        self.state = Lifecycle::Ready;
        Ok(encoded)
    }

    fn shutdown(&mut self) -> Result<Value, DispatchError> {
        match (self.state, self.policy) {
            (Lifecycle::Uninitialized, _) => Err(ProtocolError::NotInitialized {
                method: Method::Shutdown,
            }
            .into()),
            (Lifecycle::ShutDown, ShutdownPolicy::Idempotent) => {
                debug!(target: ROUTER_TARGET, "repeated shutdown acknowledged");
                Ok(Value::Null)
            }
            (Lifecycle::ShutDown, ShutdownPolicy::Strict) => {
                Err(ProtocolError::DuplicateShutdown.into())
            }
            (Lifecycle::Ready, _) => {
                self.handler.shutdown()?;
                self.state = Lifecycle::ShutDown;
                Ok(Value::Null)
            }
        }
    }

    fn workspace_references(&mut self, params: Value) -> Result<Value, DispatchError> {
        let params: WorkspaceReferenceParams = decode(Method::WorkspaceReferences, params)?;
        let query = params.query.clone();
        let mut references = self.handler.workspace_references(params)?;
        references.retain(|reference| query.matches(&reference.symbol));
        encode(&references)
    }
}

impl<H: LanguageHandler> Router for LanguageRouter<H> {
    fn handle_request(&mut self, method: Method, params: Value) -> Result<Value, DispatchError> {
        match method {
            Method::Initialize => return self.initialize(params),
            Method::Shutdown => return self.shutdown(),
            _ => self.check_ready(method)?,
        }

        match method {
            Method::Definition => encode(&self.handler.definition(decode(method, params)?)?),
            Method::XDefinition => encode(&self.handler.xdefinition(decode(method, params)?)?),
            Method::Hover => encode(&self.handler.hover(decode(method, params)?)?),
            Method::References => encode(&self.handler.references(decode(method, params)?)?),
            Method::Completion => encode(&self.handler.completion(decode(method, params)?)?),
            Method::DocumentSymbol => {
                encode(&self.handler.document_symbol(decode(method, params)?)?)
            }
            Method::WorkspaceSymbol => {
                encode(&self.handler.workspace_symbol(decode(method, params)?)?)
            }
            Method::WorkspaceReferences => self.workspace_references(params),
            Method::Packages => encode(&self.handler.packages()?),
            Method::Dependencies => encode(&self.handler.dependencies()?),
            Method::Initialize
            | Method::Shutdown
            | Method::Initialized
            | Method::Exit
            | Method::CancelRequest
            | Method::DidOpen
            | Method::DidChange
            | Method::DidClose
            | Method::WorkspaceFiles
            | Method::TextDocumentContent => {
                Err(ProtocolError::method_not_found(method.as_str()).into())
            }
        }
    }

    fn handle_notification(
        &mut self,
        method: Method,
        params: Value,
    ) -> Result<Flow, DispatchError> {
        if method == Method::Exit {
            self.handler.exit();
            return Ok(Flow::Exit);
        }
        if self.state != Lifecycle::Ready {
            debug!(
                target: ROUTER_TARGET,
                method = method.as_str(),
                "notification dropped outside the ready state"
            );
            return Ok(Flow::Continue);
        }

        match method {
            Method::DidOpen => self.handler.did_open(decode(method, params)?)?,
            Method::DidChange => self.handler.did_change(decode(method, params)?)?,
            Method::DidClose => self.handler.did_close(decode(method, params)?)?,
            Method::Initialized | Method::CancelRequest => {}
            Method::Exit
            | Method::Initialize
            | Method::Shutdown
            | Method::Definition
            | Method::XDefinition
            | Method::Hover
            | Method::References
            | Method::Completion
            | Method::DocumentSymbol
            | Method::WorkspaceSymbol
            | Method::WorkspaceReferences
            | Method::Packages
            | Method::Dependencies
            | Method::WorkspaceFiles
            | Method::TextDocumentContent => {
                return Err(ProtocolError::method_not_found(method.as_str()).into());
            }
        }
        Ok(Flow::Continue)
    }
}

/// Routes role-reversed file requests to a [`WorkspaceFileProvider`].
#[derive(Debug)]
pub struct FileRouter<P> {
    provider: P,
}

impl<P: WorkspaceFileProvider> FileRouter<P> {
    /// Wraps a file provider.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: WorkspaceFileProvider> Router for FileRouter<P> {
    fn handle_request(&mut self, method: Method, params: Value) -> Result<Value, DispatchError> {
        match method {
            Method::WorkspaceFiles => encode(&self.provider.files(decode(method, params)?)?),
            Method::TextDocumentContent => {
                encode(&self.provider.content(decode(method, params)?)?)
            }
            Method::Initialize
            | Method::Initialized
            | Method::Shutdown
            | Method::Exit
            | Method::CancelRequest
            | Method::Definition
            | Method::XDefinition
            | Method::Hover
            | Method::References
            | Method::Completion
            | Method::DocumentSymbol
            | Method::WorkspaceSymbol
            | Method::WorkspaceReferences
            | Method::Packages
            | Method::Dependencies
            | Method::DidOpen
            | Method::DidChange
            | Method::DidClose => Err(ProtocolError::method_not_found(method.as_str()).into()),
        }
    }

    fn handle_notification(
        &mut self,
        method: Method,
        _params: Value,
    ) -> Result<Flow, DispatchError> {
        match method {
            Method::CancelRequest => Ok(Flow::Continue),
            _ => Err(ProtocolError::method_not_found(method.as_str()).into()),
        }
    }
}

fn decode<P: DeserializeOwned>(method: Method, params: Value) -> Result<P, ProtocolError> {
    serde_json::from_value(params).map_err(|source| ProtocolError::InvalidParams { method, source })
}

fn encode<T: Serialize>(result: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(result)
        .map_err(|error| HandlerError::with_source("failed to encode result", error).into())
}
