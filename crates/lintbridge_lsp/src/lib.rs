//! lintbridge LSP Server
//!
//! Language Server Protocol host for lintbridge.
//! Lints open documents through the engine and offers its fixes.

mod config;
mod conversion;
mod debounce;
mod handler;
mod state;

use std::sync::Arc;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, error, info, warn};

use lintbridge_core::{DocumentId, DocumentSnapshot, LintError};

use crate::config::apply_client_settings;
use crate::conversion::to_lsp_diagnostic;
use crate::debounce::spawn_debounced_validation;
use crate::handler::ServerCommand;
use crate::state::{BackendState, SharedState};

pub use crate::handler::{FIX_FILE_COMMAND, LINT_FILE_COMMAND};

/// The LSP backend for lintbridge.
#[derive(Clone)]
pub struct Backend {
    /// LSP client for sending notifications.
    client: Client,
    /// Shared state
    state: SharedState,
}

impl Backend {
    /// Creates a new backend with the given client.
    ///
    /// Settings are loaded during `initialize`.
    pub fn new(client: Client) -> Self {
        let state = Arc::new(BackendState::new());
        state.linter.settings().on_change(|settings| {
            info!("Engine settings updated: {}", settings.executable.display());
        });
        Self { client, state }
    }

    /// Starts a lint session for an open document.
    ///
    /// Diagnostics are published when the session completes; failures keep
    /// the previous diagnostics and are reported to the user.
    fn validate_document(&self, uri: &Url) {
        debug!("Validating document: {}", uri);

        let Some(doc) = self.state.document(uri) else {
            return;
        };
        if !self.state.linter.settings().get().lints_syntax(&doc.language_id) {
            debug!("Skipping {} ({} is not linted)", uri, doc.language_id);
            return;
        }

        let mut snapshot = DocumentSnapshot::new(uri.as_str(), doc.text, doc.language_id);
        if let Ok(path) = uri.to_file_path() {
            snapshot = snapshot.with_path(path);
        }

        let client = self.client.clone();
        let uri = uri.clone();
        let version = doc.version;
        self.state.linter.start(snapshot, move |result| {
            tokio::spawn(async move {
                match result {
                    Ok(record) => {
                        let diagnostics = record.diagnostics().iter().map(to_lsp_diagnostic).collect();
                        client
                            .publish_diagnostics(uri, diagnostics, Some(version))
                            .await;
                    }
                    Err(e) => report_failure(&client, &uri, &e).await,
                }
            });
        });
    }

    /// Re-lints every open document.
    fn validate_all(&self) {
        let uris: Vec<Url> = match self.state.documents.read() {
            Ok(docs) => docs.keys().cloned().collect(),
            Err(e) => {
                error!("Documents lock poisoned: {}", e);
                return;
            }
        };
        for uri in &uris {
            self.validate_document(uri);
        }
    }

    /// Runs the engine's fix on the file behind `uri`.
    async fn fix_file(&self, uri: &Url) {
        let Ok(path) = uri.to_file_path() else {
            debug!("Cannot fix non-file URI: {}", uri);
            return;
        };
        if let Err(e) = self.state.linter.fix_file(&path).await {
            report_failure(&self.client, uri, &e).await;
            return;
        }

        // Fixed issues are gone from disk; show what is left until the re-lint lands.
        let id = DocumentId::new(uri.as_str());
        if let Some(record) = self.state.linter.store().retain(&id, |d| !d.is_fixable()) {
            let diagnostics = record.diagnostics().iter().map(to_lsp_diagnostic).collect();
            self.client
                .publish_diagnostics(uri.clone(), diagnostics, None)
                .await;
        }
    }
}

async fn report_failure(client: &Client, uri: &Url, error: &LintError) {
    warn!("Lint of {} failed: {}", uri, error);
    let kind = if error.is_user_actionable() {
        MessageType::WARNING
    } else {
        MessageType::ERROR
    };
    client.show_message(kind, error.to_string()).await;
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handler::handle_initialize(&self.state, params).await
    }

    async fn initialized(&self, _: InitializedParams) {
        handler::handle_initialized(&self.client).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handler::handle_shutdown(&self.state).await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = handler::handle_did_open(&self.state, params).await;
        self.validate_document(&uri);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some((uri, version)) = handler::handle_did_change(&self.state, params).await {
            let backend = self.clone();
            spawn_debounced_validation(self.state.clone(), uri, version, move |uri| async move {
                backend.validate_document(&uri);
            });
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = handler::handle_did_save(&self.state, params).await;
        if self.state.linter.settings().get().fix_on_save {
            self.fix_file(&uri).await;
        }
        self.validate_document(&uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = handler::handle_did_close(&self.state, params).await;
        self.state
            .linter
            .close(&DocumentId::new(uri.as_str()));

        // Clear diagnostics
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        debug!("Configuration changed");
        if apply_client_settings(&self.state, &params.settings) {
            self.validate_all();
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        if handler::handle_did_change_watched_files(&self.state, params).await {
            self.validate_all();
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        handler::handle_code_action(&self.state, params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        match ServerCommand::parse(&params) {
            Some(ServerCommand::FixFile(uri)) => {
                self.fix_file(&uri).await;
                self.validate_document(&uri);
            }
            Some(ServerCommand::LintFile(uri)) => self.validate_document(&uri),
            None => debug!("Ignoring command {}", params.command),
        }
        Ok(None)
    }
}

/// Starts the LSP server.
///
/// This function does not return unless an error occurs or the server shuts down.
pub async fn run() {
    info!("lintbridge LSP server starting...");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
