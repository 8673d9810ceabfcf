//! In-memory workspace served by the client side of test connections.

use std::collections::BTreeMap;
use std::str::FromStr;

use lsp_types::{TextDocumentIdentifier, Uri};

use crate::errors::{ErrorCode, HandlerError};
use crate::handler::WorkspaceFileProvider;
use crate::types::{TextDocumentContent, WorkspaceFilesParams};

/// Flat map from absolute path to file text.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<String, String>,
}

impl MemoryFileSystem {
    /// Adds a file at `path`, which must start with `/`.
    #[must_use]
    pub fn with_file(mut self, path: &str, text: &str) -> Self {
        self.files.insert(path.to_owned(), text.to_owned());
        self
    }
}

impl WorkspaceFileProvider for MemoryFileSystem {
    fn files(
        &mut self,
        params: WorkspaceFilesParams,
    ) -> Result<Vec<TextDocumentIdentifier>, HandlerError> {
        let base = match params.base.as_deref() {
            Some(base) => path_of(base)?,
            None => String::new(),
        };
        let base = base.trim_end_matches('/');
        let prefix = format!("{base}/");

        let documents = self
            .files
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .map(|path| document(path))
            .collect::<Result<Vec<_>, _>>()?;
        if documents.is_empty() && !base.is_empty() {
            return Err(not_found(format!("No such directory: {base}")));
        }
        Ok(documents)
    }

    fn content(
        &mut self,
        document: TextDocumentIdentifier,
    ) -> Result<TextDocumentContent, HandlerError> {
        self.files
            .get(document.uri.path().as_str())
            .map(|text| TextDocumentContent { text: text.clone() })
            .ok_or_else(|| not_found(format!("No such file: {}", document.uri.as_str())))
    }
}

fn path_of(uri: &str) -> Result<String, HandlerError> {
    Uri::from_str(uri)
        .map(|uri| uri.path().as_str().to_owned())
        .map_err(|_| not_found(format!("invalid URI: {uri}")))
}

fn document(path: &str) -> Result<TextDocumentIdentifier, HandlerError> {
    let uri = Uri::from_str(&format!("file://{path}"))
        .map_err(|_| not_found(format!("invalid path: {path}")))?;
    Ok(TextDocumentIdentifier { uri })
}

fn not_found(message: String) -> HandlerError {
    HandlerError::with_code(ErrorCode::InvalidParams.code(), message)
}
