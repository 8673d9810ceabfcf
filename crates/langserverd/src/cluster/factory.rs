//! Construction of per-connection language handlers.

use langserver_protocol::{LanguageHandler, Peer};

/// What a factory learns about the connection it builds a handler for.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Index of the worker hosting the session.
    pub worker: usize,
    /// Connection label used in logs.
    pub label: String,
    /// Whether the daemon runs with strict protocol handling.
    pub strict: bool,
    /// The remote end, for role-reversed requests such as `workspace/xfiles`.
    pub client: Peer,
}

/// Builds one [`LanguageHandler`] per accepted connection.
///
/// The factory is shared by every worker; `create` runs on the worker thread
/// that owns the new session, so a panic here takes that worker down.
pub trait HandlerFactory: Send + Sync + 'static {
    /// Handler type served behind each session.
    type Handler: LanguageHandler + 'static;

    /// Creates the handler for a new connection.
    fn create(&self, context: SessionContext) -> Self::Handler;
}

impl<F, H> HandlerFactory for F
where
    F: Fn(SessionContext) -> H + Send + Sync + 'static,
    H: LanguageHandler + 'static,
{
    type Handler = H;

    fn create(&self, context: SessionContext) -> H {
        self(context)
    }
}
