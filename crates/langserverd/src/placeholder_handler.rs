//! Placeholder language handler served until a real analysis backend is
//! plugged in through [`HandlerFactory`](crate::HandlerFactory).
//!
//! It completes the lifecycle handshake, tracks open documents and answers
//! every query with an empty result.

use std::collections::HashMap;

use langserver_protocol::{
    DependencyReference, HandlerError, LanguageHandler, PackageInformation, ReferenceInformation,
    SymbolLocationInformation, WorkspaceReferenceParams,
};
use lsp_types::{
    CompletionList, CompletionParams, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DocumentSymbolParams, GotoDefinitionParams, Hover, HoverParams,
    InitializeParams, InitializeResult, Location, OneOf, ReferenceParams, ServerCapabilities,
    ServerInfo, SymbolInformation, TextDocumentPositionParams, TextDocumentSyncCapability,
    TextDocumentSyncKind, WorkspaceSymbolParams,
};

use crate::cluster::SessionContext;

const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handler::placeholder");

/// Handler that keeps document text but performs no analysis.
#[derive(Debug)]
pub struct PlaceholderHandler {
    context: SessionContext,
    documents: HashMap<String, String>,
}

impl PlaceholderHandler {
    /// Builds the handler for one session.
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            documents: HashMap::new(),
        }
    }
}

impl LanguageHandler for PlaceholderHandler {
    fn initialize(&mut self, params: InitializeParams) -> Result<InitializeResult, HandlerError> {
        tracing::warn!(
            target: HANDLER_TARGET,
            worker = self.context.worker,
            connection = %self.context.label,
            client = ?params.client_info.map(|info| info.name),
            "serving placeholder handler; queries return empty results"
        );
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: String::from(env!("CARGO_PKG_NAME")),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
        })
    }

    fn shutdown(&mut self) -> Result<(), HandlerError> {
        self.documents.clear();
        Ok(())
    }

    fn definition(&mut self, _params: GotoDefinitionParams) -> Result<Vec<Location>, HandlerError> {
        Ok(Vec::new())
    }

    fn xdefinition(
        &mut self,
        _params: TextDocumentPositionParams,
    ) -> Result<Vec<SymbolLocationInformation>, HandlerError> {
        Ok(Vec::new())
    }

    fn hover(&mut self, _params: HoverParams) -> Result<Option<Hover>, HandlerError> {
        Ok(None)
    }

    fn references(&mut self, _params: ReferenceParams) -> Result<Vec<Location>, HandlerError> {
        Ok(Vec::new())
    }

    fn completion(&mut self, _params: CompletionParams) -> Result<CompletionList, HandlerError> {
        Ok(CompletionList {
            is_incomplete: false,
            items: Vec::new(),
        })
    }

    fn document_symbol(
        &mut self,
        _params: DocumentSymbolParams,
    ) -> Result<Vec<SymbolInformation>, HandlerError> {
        Ok(Vec::new())
    }

    fn workspace_symbol(
        &mut self,
        _params: WorkspaceSymbolParams,
    ) -> Result<Vec<SymbolInformation>, HandlerError> {
        Ok(Vec::new())
    }

    fn workspace_references(
        &mut self,
        _params: WorkspaceReferenceParams,
    ) -> Result<Vec<ReferenceInformation>, HandlerError> {
        Ok(Vec::new())
    }

    fn packages(&mut self) -> Result<Vec<PackageInformation>, HandlerError> {
        Ok(Vec::new())
    }

    fn dependencies(&mut self) -> Result<Vec<DependencyReference>, HandlerError> {
        Ok(Vec::new())
    }

    fn did_open(&mut self, params: DidOpenTextDocumentParams) -> Result<(), HandlerError> {
        let document = params.text_document;
        self.documents
            .insert(document.uri.as_str().to_owned(), document.text);
        Ok(())
    }

    fn did_change(&mut self, params: DidChangeTextDocumentParams) -> Result<(), HandlerError> {
        // Full sync: the last change carries the whole text.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .insert(params.text_document.uri.as_str().to_owned(), change.text);
        }
        Ok(())
    }

    fn did_close(&mut self, params: DidCloseTextDocumentParams) -> Result<(), HandlerError> {
        self.documents.remove(params.text_document.uri.as_str());
        Ok(())
    }
}
