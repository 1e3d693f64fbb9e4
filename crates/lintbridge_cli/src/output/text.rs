//! Text output formatter

use std::path::Path;

use lintbridge_core::{LintRecord, Severity};

pub fn output_text(path: &Path, record: &LintRecord) {
    let diagnostics = record.diagnostics();

    if !diagnostics.is_empty() {
        println!("\n{}:", path.display());
        for diag in diagnostics {
            let severity = match diag.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "info",
            };
            let fixable = if diag.is_fixable() { " (fixable)" } else { "" };
            println!(
                "  {}:{} {} [{}]: {}{}",
                diag.line,
                diag.column,
                severity,
                diag.rule_id.as_deref().unwrap_or("fatal"),
                diag.message,
                fixable
            );
        }
    }

    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();

    println!();
    println!(
        "Found {} issues ({} errors, {} warnings)",
        diagnostics.len(),
        count(Severity::Error),
        count(Severity::Warning)
    );
}
