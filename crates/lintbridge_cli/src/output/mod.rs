//! Output formatting module

mod json;
mod text;

use std::path::Path;

use miette::Result;
use lintbridge_core::{LintRecord, Severity};

use crate::cli::OutputFormat;

/// Prints a record and returns true if it contains errors.
pub fn output_record(path: &Path, record: &LintRecord, format: OutputFormat) -> Result<bool> {
    let has_errors = record
        .diagnostics()
        .iter()
        .any(|d| d.severity == Severity::Error);

    match format {
        OutputFormat::Json => json::output_json(path, record)?,
        OutputFormat::Text => text::output_text(path, record),
    }

    Ok(has_errors)
}
