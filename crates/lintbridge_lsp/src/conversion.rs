//! LSP type conversion utilities.
//!
//! Engine columns and LSP characters both count UTF-16 code units, so
//! conversions only shift between 1-based and 0-based.

use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range, TextEdit,
};

use lintbridge_core::position::{line_column_of, offset_of};
use lintbridge_core::{LintDiagnostic, OffsetRange, Severity};

/// Source name shown next to diagnostics.
pub const SOURCE: &str = "lintbridge";

/// Converts a lint diagnostic to an LSP diagnostic.
pub fn to_lsp_diagnostic(diag: &LintDiagnostic) -> Diagnostic {
    let severity = match diag.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    };

    Diagnostic {
        range: diagnostic_range(diag),
        severity: Some(severity),
        code: diag.rule_id.clone().map(NumberOrString::String),
        source: Some(SOURCE.to_string()),
        message: diag.message.clone(),
        ..Default::default()
    }
}

/// Returns the LSP range of a diagnostic's 1-based location.
pub fn diagnostic_range(diag: &LintDiagnostic) -> Range {
    Range::new(
        Position::new(diag.line.saturating_sub(1), diag.column.saturating_sub(1)),
        Position::new(diag.end_line.saturating_sub(1), diag.end_column.saturating_sub(1)),
    )
}

/// Converts a UTF-16 offset to an LSP position.
pub fn offset_to_position(offset: u32, text: &str) -> Option<Position> {
    line_column_of(text, offset).map(|(line, character)| Position::new(line, character))
}

/// Converts UTF-16 offsets to an LSP range.
pub fn offset_to_range(range: OffsetRange, text: &str) -> Option<Range> {
    Some(Range::new(
        offset_to_position(range.start, text)?,
        offset_to_position(range.end, text)?,
    ))
}

/// Converts an LSP range to UTF-16 offsets.
pub fn range_to_offsets(range: Range, text: &str) -> Option<OffsetRange> {
    let start = offset_of(text, range.start.line, range.start.character)?;
    let end = offset_of(text, range.end.line, range.end.character)?;
    (start <= end).then_some(OffsetRange::new(start, end))
}

/// Converts a planned edit to an LSP text edit.
pub fn to_lsp_edit(edit: &lintbridge_core::TextEdit, text: &str) -> Option<TextEdit> {
    Some(TextEdit {
        range: offset_to_range(edit.range(), text)?,
        new_text: edit.replacement.clone(),
    })
}
