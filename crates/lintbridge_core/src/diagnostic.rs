//! Engine result types and the diagnostics derived from them.

use serde::{Deserialize, Serialize};

use crate::LintError;
use crate::document::LineEnding;
use crate::position::{self, OffsetRange, SourcePosition};

/// Severity level for diagnostics.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - must be fixed.
    #[default]
    Error,
    /// Warning - should be reviewed.
    Warning,
    /// Info - informational message.
    Info,
}

impl Severity {
    /// Maps the engine's numeric severity (`2` error, `1` warning).
    pub fn from_engine(level: u8) -> Self {
        match level {
            2 => Severity::Error,
            1 => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

/// An engine fix: replace `range` (UTF-16 offsets) with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineFix {
    pub range: [u32; 2],
    pub text: String,
}

impl EngineFix {
    /// Creates a new fix.
    pub fn new(start: u32, end: u32, text: impl Into<String>) -> Self {
        Self {
            range: [start, end],
            text: text.into(),
        }
    }
}

/// An alternative fix the user has to pick explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSuggestion {
    pub desc: String,
    pub fix: EngineFix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// One message as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMessage {
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub severity: u8,
    pub message: String,
    /// File-level messages (e.g. "file ignored") carry no location.
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<EngineFix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<EngineSuggestion>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// The engine's per-file result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResult {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub messages: Vec<EngineMessage>,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub warning_count: u32,
    #[serde(default)]
    pub fixable_error_count: u32,
    #[serde(default)]
    pub fixable_warning_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl EngineResult {
    /// Parses the engine's `--format=json` output, which must describe
    /// exactly one input file.
    pub fn from_report(stdout: &str) -> Result<Self, LintError> {
        let mut results: Vec<EngineResult> = serde_json::from_str(stdout)
            .map_err(|e| LintError::output(format!("invalid JSON report: {e}")))?;
        if results.len() != 1 {
            return Err(LintError::output(format!(
                "expected results for one file, got {}",
                results.len()
            )));
        }
        Ok(results.remove(0))
    }

    /// Derives diagnostics in message order.
    pub fn diagnostics(&self) -> Vec<LintDiagnostic> {
        self.messages.iter().map(LintDiagnostic::from).collect()
    }
}

/// A diagnostic derived from an engine message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintDiagnostic {
    /// The rule that generated this diagnostic (`None` for parse errors).
    pub rule_id: Option<String>,
    pub severity: Severity,
    pub message: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based UTF-16 column.
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<EngineFix>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<EngineSuggestion>,
}

impl LintDiagnostic {
    /// Returns the 1-based source location.
    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.column, self.end_line, self.end_column)
    }

    /// Maps the diagnostic onto `text`.
    pub fn range(&self, text: &str, line_ending: LineEnding) -> Result<OffsetRange, LintError> {
        position::to_range(text, line_ending, self.position())
    }

    /// Returns true if the diagnostic carries an automatic fix.
    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }
}

impl From<&EngineMessage> for LintDiagnostic {
    fn from(message: &EngineMessage) -> Self {
        let line = message.line.max(1);
        let column = message.column.max(1);
        let (end_line, end_column) = match (message.end_line, message.end_column) {
            (Some(end_line), Some(end_column)) if (end_line, end_column) >= (line, column) => {
                (end_line, end_column)
            }
            _ => (line, column),
        };
        let severity = if message.fatal {
            Severity::Error
        } else {
            Severity::from_engine(message.severity)
        };

        Self {
            rule_id: message.rule_id.clone(),
            severity,
            message: message.message.clone(),
            line,
            column,
            end_line,
            end_column,
            fix: message.fix.clone(),
            suggestions: message.suggestions.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = r#"[{
        "filePath": "/work/src/a.js",
        "messages": [
            {
                "ruleId": "no-var",
                "severity": 2,
                "message": "Unexpected var, use let or const instead.",
                "line": 1, "column": 1, "endLine": 1, "endColumn": 11,
                "messageId": "unexpectedVar",
                "nodeType": "VariableDeclaration",
                "fix": { "range": [0, 3], "text": "let" }
            },
            {
                "ruleId": "no-unused-vars",
                "severity": 1,
                "message": "'a' is assigned a value but never used.",
                "line": 1, "column": 5, "endLine": 1, "endColumn": 6,
                "suggestions": [
                    { "desc": "Remove unused variable 'a'.", "messageId": "removeVar",
                      "fix": { "range": [0, 10], "text": "" } }
                ]
            }
        ],
        "suppressedMessages": [],
        "errorCount": 1,
        "fatalErrorCount": 0,
        "warningCount": 1,
        "fixableErrorCount": 1,
        "fixableWarningCount": 0,
        "source": "var a = 1;",
        "usedDeprecatedRules": []
    }]"#;

    #[test]
    fn parses_engine_report() {
        let result = EngineResult::from_report(REPORT).unwrap();

        assert_eq!(result.file_path, "/work/src/a.js");
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.fixable_error_count, 1);
        assert_eq!(result.messages[0].fix, Some(EngineFix::new(0, 3, "let")));
        assert_eq!(
            result.messages[1].suggestions.as_ref().unwrap()[0].desc,
            "Remove unused variable 'a'."
        );
    }

    #[test]
    fn rejects_reports_for_several_files() {
        let err = EngineResult::from_report("[]").unwrap_err();
        assert!(matches!(err, LintError::Output(_)));

        let two = r#"[{"filePath":"a","messages":[]},{"filePath":"b","messages":[]}]"#;
        assert!(EngineResult::from_report(two).is_err());
    }

    #[test]
    fn rejects_non_json_output() {
        let err = EngineResult::from_report("Oops!").unwrap_err();
        assert!(err.to_string().contains("invalid JSON report"));
    }

    #[test]
    fn derives_diagnostics_in_message_order() {
        let result = EngineResult::from_report(REPORT).unwrap();
        let diagnostics = result.diagnostics();

        assert_eq!(diagnostics.len(), result.messages.len());
        assert_eq!(diagnostics[0].rule_id.as_deref(), Some("no-var"));
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert!(diagnostics[0].is_fixable());
        assert_eq!(diagnostics[1].severity, Severity::Warning);
        assert_eq!(diagnostics[1].suggestions.len(), 1);
        assert_eq!(
            diagnostics[1].range("var a = 1;", LineEnding::Lf).unwrap(),
            OffsetRange::new(4, 5)
        );
    }

    #[test]
    fn file_level_message_gets_a_zero_width_location() {
        let message: EngineMessage = serde_json::from_str(
            r#"{"fatal": false, "severity": 1, "message": "File ignored because of a matching ignore pattern."}"#,
        )
        .unwrap();
        let diagnostic = LintDiagnostic::from(&message);

        assert_eq!(diagnostic.position(), SourcePosition::new(1, 1, 1, 1));
        assert_eq!(diagnostic.rule_id, None);
    }

    #[test]
    fn fatal_parse_error_is_an_error() {
        let message: EngineMessage = serde_json::from_str(
            r#"{"ruleId": null, "fatal": true, "severity": 2, "message": "Parsing error: Unexpected token", "line": 3, "column": 7}"#,
        )
        .unwrap();
        let diagnostic = LintDiagnostic::from(&message);

        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.position(), SourcePosition::new(3, 7, 3, 7));
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(Severity::from_engine(2), Severity::Error);
        assert_eq!(Severity::from_engine(1), Severity::Warning);
        assert_eq!(Severity::from_engine(0), Severity::Info);
    }
}
