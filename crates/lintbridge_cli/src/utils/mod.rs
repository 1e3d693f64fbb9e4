//! CLI utility functions

use std::path::Path;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use tokio::runtime::Runtime;
use tracing::debug;

use lintbridge_core::{EngineSettings, Linter, Settings};

use crate::cli::Cli;

pub fn create_tokio_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}

/// Loads settings from `--settings`, the current directory, or defaults,
/// then applies the command-line overrides.
pub fn load_settings(cli: &Cli) -> Result<EngineSettings> {
    let mut settings = if let Some(ref path) = cli.settings {
        EngineSettings::from_file(path).into_diagnostic()?
    } else {
        find_settings()?
    };

    if let Some(ref engine) = cli.engine {
        settings.executable = engine.clone();
    }
    if let Some(ref config) = cli.config {
        settings.config_path = Some(config.clone());
    }
    Ok(settings)
}

fn find_settings() -> Result<EngineSettings> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    match EngineSettings::discover(&cwd) {
        Some(path) => {
            debug!("Using settings file: {}", path.display());
            EngineSettings::from_file(&path).into_diagnostic()
        }
        None => Ok(EngineSettings::default()),
    }
}

pub fn create_linter(cli: &Cli) -> Result<Linter> {
    let settings = load_settings(cli)?;
    Ok(Linter::new(Arc::new(Settings::new(settings))))
}

/// Infers the syntax tag from a file extension.
pub fn syntax_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let syntax = match extension.as_str() {
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "vue" => "vue",
        "html" | "htm" => "html",
        "md" | "markdown" => "markdown",
        _ => return None,
    };
    Some(syntax)
}
