//! Latest lint results per document.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::LintError;
use crate::diagnostic::{EngineResult, LintDiagnostic};
use crate::document::{DocumentId, LineEnding};
use crate::position::OffsetRange;

/// One document's engine result together with its derived diagnostics.
///
/// `diagnostics[i]` is derived from `result.messages[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintRecord {
    result: EngineResult,
    diagnostics: Vec<LintDiagnostic>,
}

impl LintRecord {
    /// Builds a record, deriving diagnostics from the result.
    pub fn new(result: EngineResult) -> Self {
        let diagnostics = result.diagnostics();
        Self {
            result,
            diagnostics,
        }
    }

    /// Builds a record from precomputed diagnostics.
    pub fn try_from_parts(
        id: &DocumentId,
        result: EngineResult,
        diagnostics: Vec<LintDiagnostic>,
    ) -> Result<Self, LintError> {
        if result.messages.len() != diagnostics.len() {
            return Err(LintError::InconsistentStore {
                id: id.to_string(),
                results: result.messages.len(),
                diagnostics: diagnostics.len(),
            });
        }
        Ok(Self {
            result,
            diagnostics,
        })
    }

    pub fn result(&self) -> &EngineResult {
        &self.result
    }

    pub fn diagnostics(&self) -> &[LintDiagnostic] {
        &self.diagnostics
    }
}

/// Maps documents to their latest [`LintRecord`].
///
/// Records are immutable; replacing one is a single map write, so readers
/// never see a result without its diagnostics.
#[derive(Debug, Default)]
pub struct IssueStore {
    records: RwLock<HashMap<DocumentId, Arc<LintRecord>>>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `result` for `id`, replacing any previous record.
    pub fn set(&self, id: &DocumentId, result: EngineResult) -> Arc<LintRecord> {
        self.insert(id, LintRecord::new(result))
    }

    /// Stores `result` with precomputed diagnostics.
    ///
    /// Fails without touching the store when the two are out of step.
    pub fn set_with_diagnostics(
        &self,
        id: &DocumentId,
        result: EngineResult,
        diagnostics: Vec<LintDiagnostic>,
    ) -> Result<Arc<LintRecord>, LintError> {
        let record = LintRecord::try_from_parts(id, result, diagnostics)?;
        Ok(self.insert(id, record))
    }

    fn insert(&self, id: &DocumentId, record: LintRecord) -> Arc<LintRecord> {
        let record = Arc::new(record);
        debug!(
            "Storing {} diagnostics for {}",
            record.diagnostics.len(),
            id
        );
        self.records.write().insert(id.clone(), record.clone());
        record
    }

    pub fn get(&self, id: &DocumentId) -> Option<Arc<LintRecord>> {
        self.records.read().get(id).cloned()
    }

    /// Removes the record for `id`. Returns true if there was one.
    pub fn remove(&self, id: &DocumentId) -> bool {
        self.records.write().remove(id).is_some()
    }

    /// Returns the first diagnostic under `selection`.
    ///
    /// A diagnostic matches when its range intersects the selection, or,
    /// for an empty selection, when its range contains the cursor.
    pub fn find_at(
        &self,
        id: &DocumentId,
        text: &str,
        line_ending: LineEnding,
        selection: OffsetRange,
    ) -> Result<Option<LintDiagnostic>, LintError> {
        let Some(record) = self.get(id) else {
            return Ok(None);
        };

        for diagnostic in &record.diagnostics {
            let range = diagnostic.range(text, line_ending)?;
            let hit = range.intersects(&selection)
                || (selection.is_empty() && range.contains(selection.start));
            if hit {
                return Ok(Some(diagnostic.clone()));
            }
        }
        Ok(None)
    }

    /// Keeps only the message/diagnostic pairs whose diagnostic matches
    /// `keep`. Returns the updated record.
    pub fn retain<F>(&self, id: &DocumentId, mut keep: F) -> Option<Arc<LintRecord>>
    where
        F: FnMut(&LintDiagnostic) -> bool,
    {
        let mut records = self.records.write();
        let current = records.get(id)?;

        let mut result = current.result.clone();
        let mut diagnostics = Vec::with_capacity(current.diagnostics.len());
        let mut messages = Vec::with_capacity(current.result.messages.len());
        for (message, diagnostic) in current
            .result
            .messages
            .iter()
            .zip(current.diagnostics.iter())
        {
            if keep(diagnostic) {
                messages.push(message.clone());
                diagnostics.push(diagnostic.clone());
            }
        }
        result.messages = messages;

        let record = Arc::new(LintRecord {
            result,
            diagnostics,
        });
        records.insert(id.clone(), record.clone());
        Some(record)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns the ids that currently have a record.
    pub fn ids(&self) -> Vec<DocumentId> {
        self.records.read().keys().cloned().collect()
    }
}
