//! Lint command implementation

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use miette::{IntoDiagnostic, Result, miette};
use tokio::sync::oneshot;
use tracing::debug;

use lintbridge_core::{DocumentId, DocumentSnapshot, SessionState};

use crate::cli::{Cli, OutputFormat};
use crate::output::output_record;
use crate::utils::{create_linter, create_tokio_runtime, syntax_for_path};

pub fn run_lint(
    cli: &Cli,
    file: &Path,
    syntax: Option<&str>,
    stdin: bool,
    format: OutputFormat,
    timeout: Option<u64>,
) -> Result<bool> {
    let syntax = match syntax.or_else(|| syntax_for_path(file)) {
        Some(syntax) => syntax.to_string(),
        None => {
            return Err(miette!(
                "Cannot infer the syntax of {}; pass --syntax",
                file.display()
            ));
        }
    };

    let content = if stdin {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .into_diagnostic()?;
        content
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| miette!("Failed to read {}: {}", file.display(), e))?
    };

    let path = std::path::absolute(file).into_diagnostic()?;
    let id = DocumentId::new(path.display().to_string());
    let snapshot = DocumentSnapshot::new(id.clone(), content, syntax).with_path(&path);

    let linter = create_linter(cli)?;
    let runtime = create_tokio_runtime()?;

    let record = runtime.block_on(async {
        let (tx, rx) = oneshot::channel();
        let handle = linter.start(snapshot, move |result| {
            let _ = tx.send(result);
        });

        let state = match timeout {
            Some(secs) => handle.wait_timeout(Duration::from_secs(secs)).await,
            None => handle.wait().await,
        };
        debug!("Session for {} ended as {:?}", id, state);

        match state {
            SessionState::Canceled => Err(miette!("Lint of {} timed out", file.display())),
            _ => match rx.await {
                Ok(result) => result.into_diagnostic(),
                Err(_) => Err(miette!("Lint of {} was canceled", file.display())),
            },
        }
    })?;

    output_record(file, &record, format)
}
