//! LSP Backend state management.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tower_lsp::lsp_types::Url;
use tracing::error;

use lintbridge_core::{EngineSettings, Linter, Settings};

/// Document content, version and language cache.
#[derive(Debug, Clone)]
pub(crate) struct DocumentData {
    pub text: Arc<str>,
    pub version: i32,
    pub language_id: String,
}

/// Shared backend state.
pub(crate) struct BackendState {
    /// Open documents.
    pub documents: RwLock<HashMap<Url, DocumentData>>,
    /// Session orchestrator; owns the issue store and current settings.
    pub linter: Linter,
    /// Workspace root path.
    pub workspace_root: RwLock<Option<PathBuf>>,
    /// Settings from the workspace settings file, or defaults.
    file_settings: RwLock<EngineSettings>,
    /// Keys the client has set so far; they win over the file.
    client_overrides: RwLock<Map<String, Value>>,
}

impl fmt::Debug for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendState")
            .field("documents", &"<HashMap<Url, DocumentData>>")
            .field("linter", &self.linter)
            .field("workspace_root", &self.workspace_root)
            .field("file_settings", &self.file_settings)
            .field("client_overrides", &self.client_overrides)
            .finish()
    }
}

impl BackendState {
    /// Creates a new empty state with default settings.
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    /// Creates a new empty state with the given settings.
    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            linter: Linter::new(Arc::new(Settings::new(settings.clone()))),
            workspace_root: RwLock::new(None),
            file_settings: RwLock::new(settings),
            client_overrides: RwLock::new(Map::new()),
        }
    }

    /// Returns a copy of an open document.
    pub fn document(&self, uri: &Url) -> Option<DocumentData> {
        match self.documents.read() {
            Ok(docs) => docs.get(uri).cloned(),
            Err(e) => {
                error!("Documents lock poisoned: {}", e);
                None
            }
        }
    }

    /// Returns the workspace root, if known.
    pub fn workspace_root(&self) -> Option<PathBuf> {
        match self.workspace_root.read() {
            Ok(root) => root.clone(),
            Err(e) => {
                error!("Workspace root lock poisoned: {}", e);
                None
            }
        }
    }
}

impl BackendState {
    pub fn file_settings(&self) -> EngineSettings {
        match self.file_settings.read() {
            Ok(settings) => settings.clone(),
            Err(e) => {
                error!("Settings lock poisoned: {}", e);
                EngineSettings::default()
            }
        }
    }

    pub fn set_file_settings(&self, settings: EngineSettings) {
        match self.file_settings.write() {
            Ok(mut current) => *current = settings,
            Err(e) => error!("Settings lock poisoned: {}", e),
        }
    }

    pub fn client_overrides(&self) -> Map<String, Value> {
        match self.client_overrides.read() {
            Ok(overrides) => overrides.clone(),
            Err(e) => {
                error!("Settings lock poisoned: {}", e);
                Map::new()
            }
        }
    }

    pub fn set_client_overrides(&self, overrides: Map<String, Value>) {
        match self.client_overrides.write() {
            Ok(mut current) => *current = overrides,
            Err(e) => error!("Settings lock poisoned: {}", e),
        }
    }
}

impl Default for BackendState {
    fn default() -> Self {
        Self::new()
    }
}

/// Type alias for shared state.
pub type SharedState = Arc<BackendState>;
