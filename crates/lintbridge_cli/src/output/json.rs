//! JSON output formatter

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use lintbridge_core::LintRecord;

pub fn output_json(path: &Path, record: &LintRecord) -> Result<()> {
    let result = record.result();
    let output = serde_json::json!({
        "path": path.display().to_string(),
        "errorCount": result.error_count,
        "warningCount": result.warning_count,
        "diagnostics": record.diagnostics(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
