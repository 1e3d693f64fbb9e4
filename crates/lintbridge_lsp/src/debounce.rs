//! Debouncing utilities for LSP notifications.

use std::time::Duration;

use tower_lsp::lsp_types::Url;

use crate::state::{BackendState, SharedState};

/// Default debounce delay in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Spawns a debounced validation task.
///
/// Waits for the debounce period, then validates only if the document is
/// still open at the same version.
pub fn spawn_debounced_validation<F, Fut>(state: SharedState, uri: Url, version: i32, validate_fn: F)
where
    F: FnOnce(Url) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(DEFAULT_DEBOUNCE_MS)).await;

        if check_version(&state, &uri, version) {
            validate_fn(uri).await;
        }
    });
}

/// Checks if the document version is still current.
fn check_version(state: &BackendState, uri: &Url, version: i32) -> bool {
    state
        .document(uri)
        .is_some_and(|doc| doc.version == version)
}
