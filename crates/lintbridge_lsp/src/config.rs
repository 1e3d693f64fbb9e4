//! Configuration management for LSP server.
//!
//! The effective settings are the workspace settings file (or defaults)
//! with every key the client has sent laid over it.

use serde_json::{Map, Value};
use tracing::{error, info};

use lintbridge_core::{EngineSettings, LintError};

use crate::state::BackendState;

/// Key under which clients nest the settings object.
pub const SETTINGS_SECTION: &str = "lintbridge";

/// Reloads settings from the workspace root's settings file.
///
/// Without a file the defaults apply, run from the workspace root. Client
/// settings applied earlier keep overriding the file.
pub fn reload_config(state: &BackendState) {
    let Some(root) = state.workspace_root() else {
        return;
    };

    let settings = match EngineSettings::discover(&root) {
        Some(path) => {
            info!("Found settings file: {}", path.display());
            match EngineSettings::from_file(&path) {
                Ok(settings) => settings,
                Err(e) => {
                    error!("Failed to load settings: {}", e);
                    return;
                }
            }
        }
        None => EngineSettings::default(),
    };
    state.set_file_settings(settings);

    match effective_settings(state, &state.client_overrides()) {
        Ok(settings) => state.linter.settings().update(settings),
        Err(e) => error!("Failed to apply settings: {}", e),
    }
}

/// Applies settings sent by the client (`initializationOptions` or
/// `workspace/didChangeConfiguration`). Returns true if they were valid.
///
/// Only the keys present are changed.
pub fn apply_client_settings(state: &BackendState, value: &Value) -> bool {
    let value = value.get(SETTINGS_SECTION).unwrap_or(value);
    let Value::Object(incoming) = value else {
        return false;
    };

    let mut overrides = state.client_overrides();
    overrides.extend(incoming.clone());

    match effective_settings(state, &overrides) {
        Ok(settings) => {
            info!("Applying client settings");
            state.set_client_overrides(overrides);
            state.linter.settings().update(settings);
            true
        }
        Err(e) => {
            error!("Ignoring client settings: {}", e);
            false
        }
    }
}

fn effective_settings(
    state: &BackendState,
    overrides: &Map<String, Value>,
) -> Result<EngineSettings, LintError> {
    let mut value = serde_json::to_value(state.file_settings())
        .map_err(|e| LintError::config(format!("Failed to serialize settings: {}", e)))?;
    if let Value::Object(map) = &mut value {
        map.extend(overrides.clone());
    }

    let mut settings = EngineSettings::from_value(value)?;
    if settings.working_dir.is_none() {
        settings.working_dir = state.workspace_root();
    }
    Ok(settings)
}
