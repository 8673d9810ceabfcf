//! Closed set of protocol methods understood by the session.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Every method name the session can route.
///
/// Incoming method strings are parsed into this enum before dispatch, so a
/// router's `match` has to account for every variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, IntoStaticStr,
)]
pub enum Method {
    /// `initialize` request.
    #[strum(serialize = "initialize")]
    Initialize,
    /// `initialized` notification.
    #[strum(serialize = "initialized")]
    Initialized,
    /// `shutdown` request.
    #[strum(serialize = "shutdown")]
    Shutdown,
    /// `exit` notification.
    #[strum(serialize = "exit")]
    Exit,
    /// `$/cancelRequest` notification.
    #[strum(serialize = "$/cancelRequest")]
    CancelRequest,
    /// `textDocument/definition` request.
    #[strum(serialize = "textDocument/definition")]
    Definition,
    /// `textDocument/xdefinition` request.
    #[strum(serialize = "textDocument/xdefinition")]
    XDefinition,
    /// `textDocument/hover` request.
    #[strum(serialize = "textDocument/hover")]
    Hover,
    /// `textDocument/references` request.
    #[strum(serialize = "textDocument/references")]
    References,
    /// `textDocument/completion` request.
    #[strum(serialize = "textDocument/completion")]
    Completion,
    /// `textDocument/documentSymbol` request.
    #[strum(serialize = "textDocument/documentSymbol")]
    DocumentSymbol,
    /// `workspace/symbol` request.
    #[strum(serialize = "workspace/symbol")]
    WorkspaceSymbol,
    /// `workspace/xreferences` request.
    #[strum(serialize = "workspace/xreferences")]
    WorkspaceReferences,
    /// `workspace/xpackages` request.
    #[strum(serialize = "workspace/xpackages")]
    Packages,
    /// `workspace/xdependencies` request.
    #[strum(serialize = "workspace/xdependencies")]
    Dependencies,
    /// `textDocument/didOpen` notification.
    #[strum(serialize = "textDocument/didOpen")]
    DidOpen,
    /// `textDocument/didChange` notification.
    #[strum(serialize = "textDocument/didChange")]
    DidChange,
    /// `textDocument/didClose` notification.
    #[strum(serialize = "textDocument/didClose")]
    DidClose,
    /// `workspace/xfiles` request, issued by the server to the client.
    #[strum(serialize = "workspace/xfiles")]
    WorkspaceFiles,
    /// `textDocument/xcontent` request, issued by the server to the client.
    #[strum(serialize = "textDocument/xcontent")]
    TextDocumentContent,
}

impl Method {
    /// Wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether the method is sent as a notification rather than a request.
    #[must_use]
    pub const fn is_notification(self) -> bool {
        matches!(
            self,
            Self::Initialized
                | Self::Exit
                | Self::CancelRequest
                | Self::DidOpen
                | Self::DidChange
                | Self::DidClose
        )
    }
}
