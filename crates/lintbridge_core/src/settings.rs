//! Engine settings and the process-wide "current settings" accessor.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LintError;

/// Default cap for buffered subprocess output.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;

/// Settings controlling how the engine is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Engine executable, resolved through `PATH` when not absolute.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Overrides the engine's own config discovery (`--config`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,

    /// Working directory for engine processes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Run the engine's fix on disk after a document is saved.
    #[serde(default)]
    pub fix_on_save: bool,

    /// Syntaxes the host lints.
    #[serde(default = "default_syntaxes")]
    pub syntaxes: Vec<String>,

    /// Cap for buffered stdout/stderr per subprocess.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_executable() -> PathBuf {
    PathBuf::from("eslint")
}

fn default_syntaxes() -> Vec<String> {
    ["javascript", "typescript", "javascriptreact", "typescriptreact"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl EngineSettings {
    /// Settings file names, in discovery order.
    pub const CONFIG_FILES: &[&str] = &[".lintbridge.json"];

    /// Creates settings with defaults.
    pub fn new() -> Self {
        Self {
            executable: default_executable(),
            config_path: None,
            working_dir: None,
            fix_on_save: false,
            syntaxes: default_syntaxes(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Loads settings from a file.
    ///
    /// A relative `configPath` is resolved against the file's directory,
    /// which is also the default working directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LintError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| LintError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut settings = Self::from_json(&content)?;

        if let Some(base) = path.parent() {
            if let Some(config_path) = settings.config_path.as_mut()
                && config_path.is_relative()
            {
                *config_path = base.join(&*config_path);
            }
            if settings.working_dir.is_none() {
                settings.working_dir = Some(base.to_path_buf());
            }
        }

        Ok(settings)
    }

    /// Parses settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, LintError> {
        serde_json::from_str(json).map_err(|e| LintError::config(format!("Invalid settings: {}", e)))
    }

    /// Parses settings from a JSON value (e.g. LSP initialization options).
    pub fn from_value(value: serde_json::Value) -> Result<Self, LintError> {
        serde_json::from_value(value)
            .map_err(|e| LintError::config(format!("Invalid settings: {}", e)))
    }

    /// Finds a settings file in `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        let dir = dir.as_ref();
        Self::CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Returns true if documents of this syntax should be linted.
    pub fn lints_syntax(&self, syntax: &str) -> bool {
        self.syntaxes.iter().any(|s| s == syntax)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new()
    }
}

type ChangeHandler = Box<dyn Fn(&EngineSettings) + Send + Sync>;

/// Process-wide current settings with change notification.
///
/// Readers call [`Settings::get`] each time they need a value; a snapshot
/// taken before an `.await` is never refreshed, so in-flight work keeps the
/// settings it started with.
pub struct Settings {
    current: RwLock<Arc<EngineSettings>>,
    handlers: Mutex<Vec<ChangeHandler>>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("current", &self.current.read())
            .field("handlers", &self.handlers.lock().len())
            .finish()
    }
}

impl Settings {
    /// Creates a new accessor holding `settings`.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current settings.
    pub fn get(&self) -> Arc<EngineSettings> {
        self.current.read().clone()
    }

    /// Replaces the settings and notifies handlers when they changed.
    pub fn update(&self, settings: EngineSettings) {
        let settings = Arc::new(settings);
        {
            let mut current = self.current.write();
            if **current == *settings {
                return;
            }
            *current = settings.clone();
        }
        debug!("Engine settings changed: {:?}", settings);
        for handler in self.handlers.lock().iter() {
            handler(&settings);
        }
    }

    /// Registers a handler called after every change.
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(&EngineSettings) + Send + Sync + 'static,
    {
        self.handlers.lock().push(Box::new(handler));
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

/// Type alias for shared settings.
pub type SharedSettings = Arc<Settings>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn defaults_from_empty_object() {
        let settings = EngineSettings::from_json("{}").unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.executable, PathBuf::from("eslint"));
        assert!(settings.lints_syntax("typescript"));
        assert!(!settings.lints_syntax("vue"));
    }

    #[test]
    fn parses_camel_case_keys() {
        let settings = EngineSettings::from_json(
            r#"{
                "executable": "/work/node_modules/.bin/eslint",
                "configPath": "/work/.eslintrc.json",
                "fixOnSave": true,
                "syntaxes": ["javascript", "vue"],
                "maxOutputBytes": 1024
            }"#,
        )
        .unwrap();

        assert_eq!(settings.config_path, Some(PathBuf::from("/work/.eslintrc.json")));
        assert!(settings.fix_on_save);
        assert!(settings.lints_syntax("vue"));
        assert_eq!(settings.max_output_bytes, 1024);
    }

    #[test]
    fn rejects_invalid_settings() {
        let err = EngineSettings::from_json(r#"{"fixOnSave": "yes"}"#).unwrap_err();
        assert!(matches!(err, LintError::Config(_)));
    }

    #[test]
    fn from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".lintbridge.json");
        fs::write(&path, r#"{"configPath": "eslint.config.js"}"#).unwrap();

        assert_eq!(EngineSettings::discover(dir.path()), Some(path.clone()));

        let settings = EngineSettings::from_file(&path).unwrap();
        assert_eq!(settings.config_path, Some(dir.path().join("eslint.config.js")));
        assert_eq!(settings.working_dir, Some(dir.path().to_path_buf()));
    }

    #[test]
    fn discover_returns_none_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EngineSettings::discover(dir.path()), None);
    }

    #[test]
    fn update_notifies_only_on_change() {
        let settings = Settings::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        settings.on_change(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let before = settings.get();
        settings.update(EngineSettings::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut changed = EngineSettings::default();
        changed.executable = PathBuf::from("/opt/eslint");
        settings.update(changed);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(settings.get().executable, PathBuf::from("/opt/eslint"));
        // Snapshots taken earlier are unaffected.
        assert_eq!(before.executable, PathBuf::from("eslint"));
    }
}
