//! Connection and dispatch layer for language-analysis servers.
#![deny(missing_docs)]
//!
//! The crate carries JSON-RPC 2.0 messages framed with `Content-Length`
//! headers over any ordered, reliable byte stream. A [`Session`] owns one
//! connection: it correlates outbound requests with their responses through
//! a [`Peer`] and routes inbound requests and notifications, in arrival
//! order, to a [`Router`]. [`LanguageRouter`] serves the analysis methods of
//! a [`LanguageHandler`] and enforces the `initialize` / `shutdown` / `exit`
//! lifecycle; [`FileRouter`] serves the role-reversed `workspace/xfiles` and
//! `textDocument/xcontent` requests on the client side.
//!
//! [`symbol_descriptor_match`] correlates symbols across independently
//! indexed workspaces and is used to filter `workspace/xreferences` results.

mod connection;
mod descriptor;
mod errors;
mod framing;
mod handler;
mod message;
mod method;
mod router;
mod session;
mod types;

pub use connection::ConnectionStream;
pub use descriptor::{PackageDescriptor, SymbolDescriptor, symbol_descriptor_match};
pub use errors::{
    DispatchError, ErrorCode, HandlerError, ProtocolError, RequestError, SessionError,
    TransportError,
};
pub use framing::{MAX_FRAME_BYTES, MAX_HEADER_BYTES, MessageReader, MessageWriter};
pub use handler::{LanguageHandler, WorkspaceFileProvider};
pub use message::{
    DecodeError, JSONRPC_VERSION, Message, Notification, Request, RequestId, Response,
    ResponseError,
};
pub use method::Method;
pub use router::{FileRouter, Flow, LanguageRouter, Router, ShutdownPolicy};
pub use session::{
    PendingResponse, Peer, Session, SessionEnd, SessionHandle, SessionOptions,
};
pub use types::{
    DependencyReference, PackageInformation, ReferenceInformation, SymbolLocationInformation,
    TextDocumentContent, WorkspaceFilesParams, WorkspaceReferenceParams,
};
