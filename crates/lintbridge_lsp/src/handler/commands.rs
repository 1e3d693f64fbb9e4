//! `workspace/executeCommand` parsing.

use serde_json::Value;
use tower_lsp::lsp_types::{ExecuteCommandParams, Url};

/// Runs the engine's fix on the file behind the given URI.
pub const FIX_FILE_COMMAND: &str = "lintbridge.fixFile";
/// Re-lints the given document.
pub const LINT_FILE_COMMAND: &str = "lintbridge.lintFile";

/// A command the server executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    FixFile(Url),
    LintFile(Url),
}

impl ServerCommand {
    /// Parses a command whose first argument is a URI string or an object
    /// with a `uri` field.
    pub fn parse(params: &ExecuteCommandParams) -> Option<Self> {
        let uri = params.arguments.first().and_then(uri_argument)?;
        match params.command.as_str() {
            FIX_FILE_COMMAND => Some(Self::FixFile(uri)),
            LINT_FILE_COMMAND => Some(Self::LintFile(uri)),
            _ => None,
        }
    }
}

fn uri_argument(value: &Value) -> Option<Url> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("uri")?.as_str()?,
        _ => return None,
    };
    Url::parse(raw).ok()
}
