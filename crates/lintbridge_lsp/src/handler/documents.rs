//! Document lifecycle handlers (open, change, save, close).

use std::sync::Arc;

use tower_lsp::lsp_types::*;
use tracing::{debug, error};

use crate::state::{DocumentData, SharedState};

/// Handles the `textDocument/didOpen` notification.
pub async fn handle_did_open(state: &SharedState, params: DidOpenTextDocumentParams) -> Url {
    debug!("Document opened: {}", params.text_document.uri);

    let item = params.text_document;
    match state.documents.write() {
        Ok(mut docs) => {
            docs.insert(
                item.uri.clone(),
                DocumentData {
                    text: Arc::from(item.text),
                    version: item.version,
                    language_id: item.language_id,
                },
            );
        }
        Err(e) => error!("Documents lock poisoned: {}", e),
    }

    item.uri
}

/// Handles the `textDocument/didChange` notification.
///
/// Returns the URI and version for debounced validation.
pub async fn handle_did_change(
    state: &SharedState,
    params: DidChangeTextDocumentParams,
) -> Option<(Url, i32)> {
    debug!("Document changed: {}", params.text_document.uri);

    // Full sync: the last change carries the whole text.
    let change = params.content_changes.into_iter().last()?;
    let uri = params.text_document.uri;
    let version = params.text_document.version;

    let mut docs = match state.documents.write() {
        Ok(guard) => guard,
        Err(e) => {
            error!("Documents lock poisoned: {}", e);
            return None;
        }
    };
    let language_id = docs
        .get(&uri)
        .map(|doc| doc.language_id.clone())
        .unwrap_or_default();
    docs.insert(
        uri.clone(),
        DocumentData {
            text: Arc::from(change.text),
            version,
            language_id,
        },
    );

    Some((uri, version))
}

/// Handles the `textDocument/didSave` notification.
pub async fn handle_did_save(state: &SharedState, params: DidSaveTextDocumentParams) -> Url {
    debug!("Document saved: {}", params.text_document.uri);

    let uri = params.text_document.uri;
    if let Some(text) = params.text {
        match state.documents.write() {
            Ok(mut docs) => {
                if let Some(doc) = docs.get_mut(&uri) {
                    doc.text = Arc::from(text);
                }
            }
            Err(e) => error!("Documents lock poisoned: {}", e),
        }
    }

    uri
}

/// Handles the `textDocument/didClose` notification.
pub async fn handle_did_close(state: &SharedState, params: DidCloseTextDocumentParams) -> Url {
    debug!("Document closed: {}", params.text_document.uri);

    match state.documents.write() {
        Ok(mut docs) => {
            docs.remove(&params.text_document.uri);
        }
        Err(e) => error!("Documents lock poisoned: {}", e),
    }

    params.text_document.uri
}
