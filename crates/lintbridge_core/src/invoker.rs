//! Runs the engine over document content piped through stdin.

use std::path::Path;

use tracing::{debug, warn};

use crate::LintError;
use crate::cancel::{CancelSignal, Outcome};
use crate::diagnostic::EngineResult;
use crate::engine::{Engine, EngineExit};
use crate::process::{self, ProcessRun};

/// Lints in-memory content with the engine's `--stdin` mode.
#[derive(Debug)]
pub struct LintInvoker<'a> {
    engine: &'a Engine,
}

impl<'a> LintInvoker<'a> {
    /// Creates an invoker for the given engine.
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Lints `content`.
    ///
    /// `path` enables path-based rule matching in the engine; untitled
    /// documents pass `None`. `config_override` is forwarded as `--config`.
    pub async fn run(
        &self,
        content: &str,
        path: Option<&Path>,
        config_override: Option<&Path>,
        cancel: &CancelSignal,
    ) -> Result<Outcome<EngineResult>, LintError> {
        let program = self.engine.program();
        let command = self
            .engine
            .command(self.engine.lint_args(path, config_override));
        let limit = self.engine.settings().max_output_bytes;

        let captured = match process::run(command, &program, Some(content), limit, cancel).await? {
            ProcessRun::Exited(captured) => captured,
            ProcessRun::Canceled => return Ok(Outcome::Canceled),
        };

        let exit = EngineExit::from_status(&captured.status);
        debug!("Lint exited with {:?}", exit);

        match exit {
            EngineExit::Clean | EngineExit::IssuesFound => {
                if !captured.stderr.trim().is_empty() {
                    warn!("{}", captured.stderr.trim());
                }
                EngineResult::from_report(&captured.stdout).map(Outcome::Finished)
            }
            EngineExit::Terminated => Ok(Outcome::Canceled),
            EngineExit::Failed(code) => Err(LintError::LintFailed {
                code,
                stderr: captured.stderr,
            }),
        }
    }
}
