//! Contracts implemented by the analysis backend and by clients that serve
//! workspace files.

use std::fmt;

use lsp_types::{
    CompletionList, CompletionParams, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DocumentSymbolParams, GotoDefinitionParams, Hover, HoverParams,
    InitializeParams, InitializeResult, Location, ReferenceParams, SymbolInformation,
    TextDocumentIdentifier, TextDocumentPositionParams, WorkspaceSymbolParams,
};

use crate::errors::HandlerError;
use crate::types::{
    DependencyReference, PackageInformation, ReferenceInformation, SymbolLocationInformation,
    TextDocumentContent, WorkspaceFilesParams, WorkspaceReferenceParams,
};

/// Protocol methods a session may invoke on the analysis backend.
///
/// One handler serves exactly one connection and is called sequentially in
/// arrival order. A handler that needs workspace files issues role-reversed
/// requests through the [`Peer`](crate::Peer) it was built with; blocking on
/// them does not stall the session's reader.
pub trait LanguageHandler: Send {
    /// Handles `initialize` and returns the advertised capabilities.
    fn initialize(&mut self, params: InitializeParams) -> Result<InitializeResult, HandlerError>;

    /// Handles `shutdown`.
    fn shutdown(&mut self) -> Result<(), HandlerError>;

    /// Handles `exit`. The session closes the connection afterwards.
    fn exit(&mut self) {}

    /// Handles `textDocument/definition`.
    fn definition(&mut self, params: GotoDefinitionParams) -> Result<Vec<Location>, HandlerError>;

    /// Handles `textDocument/xdefinition`.
    fn xdefinition(
        &mut self,
        params: TextDocumentPositionParams,
    ) -> Result<Vec<SymbolLocationInformation>, HandlerError>;

    /// Handles `textDocument/hover`.
    fn hover(&mut self, params: HoverParams) -> Result<Option<Hover>, HandlerError>;

    /// Handles `textDocument/references`.
    fn references(&mut self, params: ReferenceParams) -> Result<Vec<Location>, HandlerError>;

    /// Handles `textDocument/completion`. Item order carries no meaning.
    fn completion(&mut self, params: CompletionParams) -> Result<CompletionList, HandlerError>;

    /// Handles `textDocument/documentSymbol`.
    fn document_symbol(
        &mut self,
        params: DocumentSymbolParams,
    ) -> Result<Vec<SymbolInformation>, HandlerError>;

    /// Handles `workspace/symbol`.
    fn workspace_symbol(
        &mut self,
        params: WorkspaceSymbolParams,
    ) -> Result<Vec<SymbolInformation>, HandlerError>;

    /// Handles `workspace/xreferences`.
    ///
    /// The router drops results whose symbol does not match `params.query`.
    fn workspace_references(
        &mut self,
        params: WorkspaceReferenceParams,
    ) -> Result<Vec<ReferenceInformation>, HandlerError>;

    /// Handles `workspace/xpackages`.
    fn packages(&mut self) -> Result<Vec<PackageInformation>, HandlerError>;

    /// Handles `workspace/xdependencies`.
    fn dependencies(&mut self) -> Result<Vec<DependencyReference>, HandlerError>;

    /// Handles `textDocument/didOpen`.
    fn did_open(&mut self, params: DidOpenTextDocumentParams) -> Result<(), HandlerError>;

    /// Handles `textDocument/didChange`. Content changes replace the whole
    /// document text.
    fn did_change(&mut self, params: DidChangeTextDocumentParams) -> Result<(), HandlerError>;

    /// Handles `textDocument/didClose`.
    fn did_close(&mut self, params: DidCloseTextDocumentParams) -> Result<(), HandlerError>;
}

impl fmt::Debug for dyn LanguageHandler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("LanguageHandler")
    }
}

impl<H: LanguageHandler + ?Sized> LanguageHandler for Box<H> {
    fn initialize(&mut self, params: InitializeParams) -> Result<InitializeResult, HandlerError> {
        (**self).initialize(params)
    }

    fn shutdown(&mut self) -> Result<(), HandlerError> {
        (**self).shutdown()
    }

    fn exit(&mut self) {
        (**self).exit();
    }

    fn definition(&mut self, params: GotoDefinitionParams) -> Result<Vec<Location>, HandlerError> {
        (**self).definition(params)
    }

    fn xdefinition(
        &mut self,
        params: TextDocumentPositionParams,
    ) -> Result<Vec<SymbolLocationInformation>, HandlerError> {
        (**self).xdefinition(params)
    }

    fn hover(&mut self, params: HoverParams) -> Result<Option<Hover>, HandlerError> {
        (**self).hover(params)
    }

    fn references(&mut self, params: ReferenceParams) -> Result<Vec<Location>, HandlerError> {
        (**self).references(params)
    }

    fn completion(&mut self, params: CompletionParams) -> Result<CompletionList, HandlerError> {
        (**self).completion(params)
    }

    fn document_symbol(
        &mut self,
        params: DocumentSymbolParams,
    ) -> Result<Vec<SymbolInformation>, HandlerError> {
        (**self).document_symbol(params)
    }

    fn workspace_symbol(
        &mut self,
        params: WorkspaceSymbolParams,
    ) -> Result<Vec<SymbolInformation>, HandlerError> {
        (**self).workspace_symbol(params)
    }

    fn workspace_references(
        &mut self,
        params: WorkspaceReferenceParams,
    ) -> Result<Vec<ReferenceInformation>, HandlerError> {
        (**self).workspace_references(params)
    }

    fn packages(&mut self) -> Result<Vec<PackageInformation>, HandlerError> {
        (**self).packages()
    }

    fn dependencies(&mut self) -> Result<Vec<DependencyReference>, HandlerError> {
        (**self).dependencies()
    }

    fn did_open(&mut self, params: DidOpenTextDocumentParams) -> Result<(), HandlerError> {
        (**self).did_open(params)
    }

    fn did_change(&mut self, params: DidChangeTextDocumentParams) -> Result<(), HandlerError> {
        (**self).did_change(params)
    }

    fn did_close(&mut self, params: DidCloseTextDocumentParams) -> Result<(), HandlerError> {
        (**self).did_close(params)
    }
}

/// Workspace file access served by the client side of a connection.
pub trait WorkspaceFileProvider: Send {
    /// Lists the files below `params.base`.
    fn files(
        &mut self,
        params: WorkspaceFilesParams,
    ) -> Result<Vec<TextDocumentIdentifier>, HandlerError>;

    /// Returns the full text of one file.
    fn content(
        &mut self,
        document: TextDocumentIdentifier,
    ) -> Result<TextDocumentContent, HandlerError>;
}
