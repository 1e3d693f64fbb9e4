//! Lint bridge error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while linting through the engine.
#[derive(Debug, Error)]
pub enum LintError {
    /// The engine could not be started.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `--print-config` exited with an unexpected code.
    #[error("Failed to get engine config for {}: {}", path.display(), describe_exit(*code, stderr))]
    ConfigFetch {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    /// The effective config lacks the plugin required by the syntax.
    #[error("The \"{plugin}\" plugin is required to lint {syntax} files but is not configured")]
    MissingPlugin { plugin: String, syntax: String },

    /// A lint or fix run exited with an unexpected code.
    #[error("Engine failed: {}", describe_exit(*code, stderr))]
    LintFailed { code: Option<i32>, stderr: String },

    /// Engine output did not have the expected shape.
    #[error("Unexpected engine output: {0}")]
    Output(String),

    /// Engine output exceeded the configured buffer cap.
    #[error("Engine output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    /// A location does not exist in the document.
    #[error("Position error: {0}")]
    Position(String),

    /// Results and diagnostics for a document are out of step.
    #[error("Inconsistent issue store for {id}: {results} messages but {diagnostics} diagnostics")]
    InconsistentStore {
        id: String,
        results: usize,
        diagnostics: usize,
    },

    /// Two fixes touch the same text.
    #[error("Overlapping fixes at [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    OverlappingFixes {
        first_start: u32,
        first_end: u32,
        second_start: u32,
        second_end: u32,
    },

    /// Settings error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LintError {
    /// Creates a spawn error.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Creates a missing plugin error.
    pub fn missing_plugin(plugin: impl Into<String>, syntax: impl Into<String>) -> Self {
        Self::MissingPlugin {
            plugin: plugin.into(),
            syntax: syntax.into(),
        }
    }

    /// Creates an output error.
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }

    /// Creates a position error.
    pub fn position(message: impl Into<String>) -> Self {
        Self::Position(message.into())
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true when the user can resolve the error by changing their
    /// engine setup (as opposed to a broken installation or a bug).
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, Self::MissingPlugin { .. })
    }
}

fn describe_exit(code: Option<i32>, stderr: &str) -> String {
    let code = match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };
    let stderr = stderr.trim();
    if stderr.is_empty() {
        code
    } else {
        format!("{code}: {stderr}")
    }
}
