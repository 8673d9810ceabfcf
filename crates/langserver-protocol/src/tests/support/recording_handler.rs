//! Recording language handler used in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lsp_types::{
    CompletionItem, CompletionList, CompletionParams, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DocumentSymbolParams,
    GotoDefinitionParams, Hover, HoverContents, HoverParams, HoverProviderCapability,
    InitializeParams, InitializeResult, Location, MarkupContent, MarkupKind, OneOf, Position,
    Range, ReferenceParams, ServerCapabilities, SymbolInformation, TextDocumentPositionParams,
    TextDocumentSyncCapability, TextDocumentSyncKind, Uri, WorkspaceSymbolParams,
};
use serde_json::Value;

use crate::descriptor::{PackageDescriptor, SymbolDescriptor};
use crate::errors::HandlerError;
use crate::handler::LanguageHandler;
use crate::method::Method;
use crate::session::Peer;
use crate::types::{
    DependencyReference, PackageInformation, ReferenceInformation, SymbolLocationInformation,
    WorkspaceFilesParams, WorkspaceReferenceParams,
};

/// Knobs that change how the recording handler answers.
#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    /// Sleep this long inside `textDocument/definition`.
    pub definition_delay: Option<Duration>,
    /// Fail `textDocument/hover` with this code and message.
    pub hover_error: Option<(i64, String)>,
}

/// Test double that records every call routed through it.
pub struct RecordingHandler {
    shared: Arc<Mutex<RecordingState>>,
    behaviour: Behaviour,
    peer: Option<Peer>,
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<Method>,
    documents: HashMap<String, String>,
}

/// Read-only view of what a [`RecordingHandler`] saw.
#[derive(Clone)]
pub struct RecordingHandle {
    shared: Arc<Mutex<RecordingState>>,
}

impl RecordingHandler {
    /// Creates a handler with the given behaviour.
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            shared: Arc::new(Mutex::new(RecordingState::default())),
            behaviour,
            peer: None,
        }
    }

    /// Attaches the connection used for role-reversed requests.
    #[must_use]
    pub fn with_peer(mut self, peer: Peer) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Returns a handle for asserting recorded calls.
    pub fn handle(&self) -> RecordingHandle {
        RecordingHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn record(&self, method: Method) {
        self.shared.lock().expect("recording lock").calls.push(method);
    }

    fn peer(&self) -> Result<&Peer, HandlerError> {
        self.peer
            .as_ref()
            .ok_or_else(|| HandlerError::new("no client connection"))
    }
}

impl RecordingHandle {
    /// Calls in the order they were received.
    pub fn calls(&self) -> Vec<Method> {
        self.shared.lock().expect("recording lock").calls.clone()
    }

    /// Number of calls of one kind.
    pub fn count(&self, method: Method) -> usize {
        self.calls().into_iter().filter(|call| *call == method).count()
    }

    /// Current text of an open document.
    pub fn document(&self, uri: &str) -> Option<String> {
        self.shared
            .lock()
            .expect("recording lock")
            .documents
            .get(uri)
            .cloned()
    }
}

/// Location spanning the first five characters of `uri`.
pub fn sample_location(uri: Uri) -> Location {
    Location::new(uri, Range::new(Position::new(0, 0), Position::new(0, 5)))
}

/// Descriptor for a symbol named `name` in package `package`.
pub fn symbol(name: &str, kind: &str, package: &str) -> SymbolDescriptor {
    SymbolDescriptor {
        name: Some(name.to_owned()),
        kind: Some(kind.to_owned()),
        package: Some(PackageDescriptor::named(package)),
        ..SymbolDescriptor::default()
    }
}

impl LanguageHandler for RecordingHandler {
    fn initialize(&mut self, _params: InitializeParams) -> Result<InitializeResult, HandlerError> {
        self.record(Method::Initialize);
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                ..ServerCapabilities::default()
            },
            server_info: None,
        })
    }

    fn shutdown(&mut self) -> Result<(), HandlerError> {
        self.record(Method::Shutdown);
        Ok(())
    }

    fn exit(&mut self) {
        self.record(Method::Exit);
    }

    fn definition(&mut self, params: GotoDefinitionParams) -> Result<Vec<Location>, HandlerError> {
        self.record(Method::Definition);
        if let Some(delay) = self.behaviour.definition_delay {
            thread::sleep(delay);
        }
        let uri = params.text_document_position_params.text_document.uri;
        Ok(vec![sample_location(uri)])
    }

    fn xdefinition(
        &mut self,
        params: TextDocumentPositionParams,
    ) -> Result<Vec<SymbolLocationInformation>, HandlerError> {
        self.record(Method::XDefinition);
        Ok(vec![SymbolLocationInformation {
            location: Some(sample_location(params.text_document.uri)),
            symbol: symbol("a", "const", "mypkg"),
        }])
    }

    fn hover(&mut self, _params: HoverParams) -> Result<Option<Hover>, HandlerError> {
        self.record(Method::Hover);
        if let Some((code, message)) = &self.behaviour.hover_error {
            return Err(HandlerError::with_code(*code, message.clone()));
        }
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::PlainText,
                value: String::from("const a: number"),
            }),
            range: None,
        }))
    }

    fn references(&mut self, params: ReferenceParams) -> Result<Vec<Location>, HandlerError> {
        self.record(Method::References);
        let uri = params.text_document_position.text_document.uri;
        Ok(vec![sample_location(uri.clone()), sample_location(uri)])
    }

    fn completion(&mut self, _params: CompletionParams) -> Result<CompletionList, HandlerError> {
        self.record(Method::Completion);
        Ok(CompletionList {
            is_incomplete: false,
            items: vec![
                CompletionItem::new_simple(String::from("a"), String::from("number")),
                CompletionItem::new_simple(String::from("b"), String::from("string")),
            ],
        })
    }

    fn document_symbol(
        &mut self,
        _params: DocumentSymbolParams,
    ) -> Result<Vec<SymbolInformation>, HandlerError> {
        self.record(Method::DocumentSymbol);
        Ok(Vec::new())
    }

    fn workspace_symbol(
        &mut self,
        _params: WorkspaceSymbolParams,
    ) -> Result<Vec<SymbolInformation>, HandlerError> {
        self.record(Method::WorkspaceSymbol);
        Ok(Vec::new())
    }

    fn workspace_references(
        &mut self,
        _params: WorkspaceReferenceParams,
    ) -> Result<Vec<ReferenceInformation>, HandlerError> {
        self.record(Method::WorkspaceReferences);
        let uri = "file:///a.ts".parse::<Uri>().map_err(|_| HandlerError::new("bad uri"))?;
        Ok(vec![
            ReferenceInformation {
                reference: sample_location(uri.clone()),
                symbol: symbol("a", "class", "mypkg"),
            },
            ReferenceInformation {
                reference: sample_location(uri.clone()),
                symbol: symbol("b", "function", "mypkg"),
            },
            ReferenceInformation {
                reference: sample_location(uri),
                symbol: symbol("a", "class", "otherpkg"),
            },
        ])
    }

    fn packages(&mut self) -> Result<Vec<PackageInformation>, HandlerError> {
        self.record(Method::Packages);
        let peer = self.peer()?;
        let mut packages = Vec::new();
        for document in peer.workspace_files(&WorkspaceFilesParams::default())? {
            if !document.uri.path().as_str().ends_with("/package.json") {
                continue;
            }
            let content = peer.text_document_content(&document)?;
            let manifest: Value = serde_json::from_str(&content.text)
                .map_err(|error| HandlerError::with_source("invalid package.json", error))?;
            packages.push(PackageInformation {
                package: PackageDescriptor {
                    name: manifest["name"].as_str().map(str::to_owned),
                    version: manifest["version"].as_str().map(str::to_owned),
                    repo_url: None,
                },
                dependencies: Vec::new(),
            });
        }
        Ok(packages)
    }

    fn dependencies(&mut self) -> Result<Vec<DependencyReference>, HandlerError> {
        self.record(Method::Dependencies);
        Ok(vec![DependencyReference {
            attributes: PackageDescriptor::named("typescript"),
            hints: None,
        }])
    }

    fn did_open(&mut self, params: DidOpenTextDocumentParams) -> Result<(), HandlerError> {
        self.record(Method::DidOpen);
        let document = params.text_document;
        self.shared
            .lock()
            .expect("recording lock")
            .documents
            .insert(document.uri.as_str().to_owned(), document.text);
        Ok(())
    }

    fn did_change(&mut self, params: DidChangeTextDocumentParams) -> Result<(), HandlerError> {
        self.record(Method::DidChange);
        let Some(change) = params.content_changes.into_iter().last() else {
            return Ok(());
        };
        self.shared
            .lock()
            .expect("recording lock")
            .documents
            .insert(params.text_document.uri.as_str().to_owned(), change.text);
        Ok(())
    }

    fn did_close(&mut self, params: DidCloseTextDocumentParams) -> Result<(), HandlerError> {
        self.record(Method::DidClose);
        self.shared
            .lock()
            .expect("recording lock")
            .documents
            .remove(params.text_document.uri.as_str());
        Ok(())
    }
}
