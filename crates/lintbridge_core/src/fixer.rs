//! Fix planning: turns diagnostics into an ordered, non-overlapping edit set.

use tracing::debug;

use crate::LintError;
use crate::diagnostic::{EngineFix, LintDiagnostic};
use crate::position::{OffsetRange, utf16_to_byte};

/// Replace `[start, end)` (UTF-16 offsets) with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: u32,
    pub end: u32,
    pub replacement: String,
}

impl TextEdit {
    pub fn range(&self) -> OffsetRange {
        OffsetRange::new(self.start, self.end)
    }
}

impl From<&EngineFix> for TextEdit {
    fn from(fix: &EngineFix) -> Self {
        Self {
            start: fix.range[0],
            end: fix.range[1],
            replacement: fix.text.clone(),
        }
    }
}

/// Edits to apply plus the diagnostics that have no automatic fix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixPlan {
    /// Sorted by start offset, descending, so each edit leaves the offsets
    /// of the remaining ones valid.
    pub edits: Vec<TextEdit>,
    /// Diagnostics without a fix, in their original order.
    pub unfixable: Vec<LintDiagnostic>,
}

impl FixPlan {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Plans the edits for all fixable diagnostics.
///
/// Fails on reversed ranges and on fixes that touch the same text; ranges
/// that only meet at a boundary are fine.
pub fn compute_edits(diagnostics: &[LintDiagnostic]) -> Result<FixPlan, LintError> {
    let mut edits = Vec::new();
    let mut unfixable = Vec::new();

    for diagnostic in diagnostics {
        match &diagnostic.fix {
            Some(fix) => {
                let edit = TextEdit::from(fix);
                if edit.start > edit.end {
                    return Err(LintError::position(format!(
                        "fix range [{}, {}) is reversed",
                        edit.start, edit.end
                    )));
                }
                edits.push(edit);
            }
            None => unfixable.push(diagnostic.clone()),
        }
    }

    // At a shared start the replacement goes first, so an insertion there
    // lands in front of the replaced text. Stable, so insertions at the
    // same point keep their report order.
    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    // Sorted descending: any overlap shows up between neighbours.
    for pair in edits.windows(2) {
        let (later, earlier) = (&pair[0], &pair[1]);
        let overlaps = !(earlier.end <= later.start || earlier.start >= later.end);
        if overlaps {
            return Err(LintError::OverlappingFixes {
                first_start: earlier.start,
                first_end: earlier.end,
                second_start: later.start,
                second_end: later.end,
            });
        }
    }

    debug!(
        "Planned {} edits, {} unfixable",
        edits.len(),
        unfixable.len()
    );
    Ok(FixPlan { edits, unfixable })
}

/// Applies planned edits to `text`.
///
/// Edits must be sorted descending, as returned by [`compute_edits`].
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, LintError> {
    let mut result = text.to_string();
    for edit in edits {
        let (Some(start), Some(end)) = (
            utf16_to_byte(&result, edit.start),
            utf16_to_byte(&result, edit.end),
        ) else {
            return Err(LintError::position(format!(
                "fix range [{}, {}) is outside the document",
                edit.start, edit.end
            )));
        };
        result.replace_range(start..end, &edit.replacement);
    }
    Ok(result)
}

/// A fix the user can pick for one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixChoice {
    pub title: String,
    pub fix: EngineFix,
}

/// Lists the automatic fix first, then each suggestion.
pub fn fix_choices(diagnostic: &LintDiagnostic) -> Vec<FixChoice> {
    let fix = diagnostic.fix.iter().map(|fix| FixChoice {
        title: "Fix".to_string(),
        fix: fix.clone(),
    });
    let suggestions = diagnostic.suggestions.iter().map(|s| FixChoice {
        title: s.desc.clone(),
        fix: s.fix.clone(),
    });
    fix.chain(suggestions).collect()
}
