//! Front-end transport: a TCP listener feeding accepted connections to a
//! [`ConnectionHandler`].

mod errors;
mod listener;

#[cfg(test)]
pub(crate) mod test_utils;

pub use errors::ListenerError;
pub use langserver_protocol::ConnectionStream;
pub use listener::{ListenerHandle, TcpSocketListener};

pub(crate) const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Receives every connection the listener accepts.
///
/// Implementations are called on the accept thread and must hand the stream
/// off quickly.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Takes ownership of an accepted connection.
    fn handle(&self, stream: ConnectionStream);
}
