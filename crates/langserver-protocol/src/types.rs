//! Payloads of the protocol extensions layered on top of LSP.

use lsp_types::Location;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::{PackageDescriptor, SymbolDescriptor};

/// Result item of `textDocument/xdefinition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolLocationInformation {
    /// Definition site, absent when the symbol is defined outside the
    /// workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Descriptor of the symbol found at the position.
    pub symbol: SymbolDescriptor,
}

/// Parameters of `workspace/xreferences`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceReferenceParams {
    /// Descriptor the returned references must match.
    pub query: SymbolDescriptor,
    /// Backend-specific narrowing hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Map<String, Value>>,
}

/// Result item of `workspace/xreferences`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceInformation {
    /// Location of the reference.
    pub reference: Location,
    /// Descriptor of the referenced symbol.
    pub symbol: SymbolDescriptor,
}

/// Result item of `workspace/xpackages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInformation {
    /// Package defined in the workspace.
    pub package: PackageDescriptor,
    /// Packages it depends on.
    pub dependencies: Vec<DependencyReference>,
}

/// Result item of `workspace/xdependencies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyReference {
    /// Identity of the dependency.
    pub attributes: PackageDescriptor,
    /// Backend-specific resolution hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Map<String, Value>>,
}

/// Parameters of `workspace/xfiles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFilesParams {
    /// Directory URI to list below; the workspace root when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

/// Result of `textDocument/xcontent`.
///
/// The request itself carries a bare `TextDocumentIdentifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocumentContent {
    /// Full document text.
    pub text: String,
}
