//! Fix command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result, miette};
use tracing::info;

use crate::cli::Cli;
use crate::utils::{create_linter, create_tokio_runtime};

pub fn run_fix(cli: &Cli, file: &Path) -> Result<()> {
    if !file.is_file() {
        return Err(miette!("File not found: {}", file.display()));
    }

    let linter = create_linter(cli)?;
    create_tokio_runtime()?
        .block_on(linter.fix_file(file))
        .into_diagnostic()?;

    info!("Applied fixes to {}", file.display());
    Ok(())
}
