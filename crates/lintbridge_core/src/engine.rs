//! The engine's command-line contract.
//!
//! Argument layout, exit codes and the syntax -> required plugin table live
//! here so the gate, the invoker and the fixer agree on them.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::Command;

use crate::settings::EngineSettings;

/// Classification of an engine exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineExit {
    /// Exit 0: no problems reported.
    Clean,
    /// Exit 1: problems reported. Not an error.
    IssuesFound,
    /// The process was asked to terminate.
    Terminated,
    /// Anything else.
    Failed(Option<i32>),
}

impl EngineExit {
    /// Exit code the engine reports when it is terminated by a signal.
    pub const TERMINATED_CODE: i32 = 15;

    /// Classifies an exit code (`None` when killed by a signal).
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => EngineExit::Clean,
            Some(1) => EngineExit::IssuesFound,
            Some(Self::TERMINATED_CODE) => EngineExit::Terminated,
            other => EngineExit::Failed(other),
        }
    }

    /// Classifies a process exit status.
    pub fn from_status(status: &ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if status.signal() == Some(libc::SIGTERM) {
                return EngineExit::Terminated;
            }
        }
        Self::from_code(status.code())
    }

    /// Returns true for exit codes after which stdout holds a report.
    pub fn has_report(self) -> bool {
        matches!(self, EngineExit::Clean | EngineExit::IssuesFound)
    }
}

/// Returns the plugin a syntax needs before it can be linted.
///
/// Syntaxes outside this table are never gated.
pub fn required_plugin(syntax: &str) -> Option<&'static str> {
    match syntax {
        "html" => Some("html"),
        "vue" => Some("vue"),
        "markdown" => Some("markdown"),
        _ => None,
    }
}

/// File extension used for untitled documents of a gated syntax.
pub(crate) fn untitled_extension(syntax: &str) -> &'static str {
    match syntax {
        "html" => "html",
        "vue" => "vue",
        "markdown" => "md",
        _ => "js",
    }
}

/// Builds engine invocations from one settings snapshot.
#[derive(Debug, Clone)]
pub struct Engine {
    settings: Arc<EngineSettings>,
}

impl Engine {
    /// Creates an engine bound to a settings snapshot.
    pub fn new(settings: Arc<EngineSettings>) -> Self {
        Self { settings }
    }

    /// Returns the settings snapshot.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the executable name for messages.
    pub fn program(&self) -> String {
        self.settings.executable.display().to_string()
    }

    /// Arguments for `--print-config`.
    pub fn print_config_args(&self, path: &Path) -> Vec<OsString> {
        let mut args = vec![OsString::from("--print-config"), path.as_os_str().to_owned()];
        self.push_config_override(&mut args);
        args
    }

    /// Arguments for linting stdin.
    pub fn lint_args(&self, path: Option<&Path>, config_override: Option<&Path>) -> Vec<OsString> {
        let mut args = vec![OsString::from("--format=json"), OsString::from("--stdin")];
        if let Some(path) = path {
            args.push("--stdin-filename".into());
            args.push(path.as_os_str().to_owned());
        }
        if let Some(config) = config_override {
            args.push("--config".into());
            args.push(config.as_os_str().to_owned());
        }
        args
    }

    /// Arguments for fixing a file on disk.
    pub fn fix_args(&self, path: &Path) -> Vec<OsString> {
        let mut args = vec![OsString::from("--fix"), OsString::from("--format=json")];
        self.push_config_override(&mut args);
        args.push(path.as_os_str().to_owned());
        args
    }

    /// Path used to resolve the config of an untitled document.
    pub fn untitled_path(&self, syntax: &str) -> PathBuf {
        let name = format!("untitled.{}", untitled_extension(syntax));
        match &self.settings.working_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Creates a command with piped stdio in the configured working directory.
    pub(crate) fn command(&self, args: Vec<OsString>) -> Command {
        let mut cmd = Command::new(&self.settings.executable);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.settings.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn push_config_override(&self, args: &mut Vec<OsString>) {
        if let Some(config) = &self.settings.config_path {
            args.push("--config".into());
            args.push(config.as_os_str().to_owned());
        }
    }
}
