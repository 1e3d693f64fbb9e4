//! Code action handler for quick fixes and fix-all.

use std::collections::HashMap;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::debug;

use lintbridge_core::{DocumentId, LineEnding, compute_edits, fix_choices};

use crate::conversion::{range_to_offsets, to_lsp_diagnostic, to_lsp_edit};
use crate::state::SharedState;

/// Handles the `textDocument/codeAction` request.
pub async fn handle_code_action(
    state: &SharedState,
    params: CodeActionParams,
) -> Result<Option<CodeActionResponse>> {
    debug!("Code action request: {}", params.text_document.uri);

    let uri = &params.text_document.uri;
    let Some(doc) = state.document(uri) else {
        return Ok(None);
    };
    let id = DocumentId::new(uri.as_str());

    let mut actions = Vec::new();

    let (wants_fix_all, wants_quickfix) = match &params.context.only {
        Some(only) => (
            only.contains(&CodeActionKind::SOURCE_FIX_ALL),
            only.contains(&CodeActionKind::QUICKFIX),
        ),
        None => (true, true),
    };

    if wants_quickfix {
        add_quickfix_actions(state, &id, &doc.text, uri, params.range, &mut actions);
    }

    if wants_fix_all {
        add_fix_all_action(state, &id, &doc.text, uri, &mut actions);
    }

    Ok(Some(actions))
}

fn add_quickfix_actions(
    state: &SharedState,
    id: &DocumentId,
    text: &str,
    uri: &Url,
    request_range: Range,
    actions: &mut Vec<CodeActionOrCommand>,
) {
    let Some(selection) = range_to_offsets(request_range, text) else {
        return;
    };
    let diagnostic = match state
        .linter
        .store()
        .find_at(id, text, LineEnding::detect(text), selection)
    {
        Ok(Some(diagnostic)) => diagnostic,
        Ok(None) => return,
        Err(e) => {
            debug!("Stored diagnostics no longer match {}: {}", uri, e);
            return;
        }
    };

    for (index, choice) in fix_choices(&diagnostic).into_iter().enumerate() {
        let edit = lintbridge_core::TextEdit::from(&choice.fix);
        let Some(edit) = to_lsp_edit(&edit, text) else {
            continue;
        };
        let title = if diagnostic.is_fixable() && index == 0 {
            format!("Fix: {}", diagnostic.message)
        } else {
            choice.title
        };

        let action = CodeAction {
            title,
            kind: Some(CodeActionKind::QUICKFIX),
            diagnostics: Some(vec![to_lsp_diagnostic(&diagnostic)]),
            edit: Some(WorkspaceEdit {
                changes: Some(HashMap::from([(uri.clone(), vec![edit])])),
                ..Default::default()
            }),
            is_preferred: Some(diagnostic.is_fixable() && index == 0),
            ..Default::default()
        };
        actions.push(CodeActionOrCommand::CodeAction(action));
    }
}

fn add_fix_all_action(
    state: &SharedState,
    id: &DocumentId,
    text: &str,
    uri: &Url,
    actions: &mut Vec<CodeActionOrCommand>,
) {
    let Some(record) = state.linter.store().get(id) else {
        return;
    };
    let plan = match compute_edits(record.diagnostics()) {
        Ok(plan) => plan,
        Err(e) => {
            debug!("No fix-all for {}: {}", uri, e);
            return;
        }
    };
    if plan.is_empty() {
        return;
    }

    let edits: Vec<TextEdit> = plan
        .edits
        .iter()
        .filter_map(|edit| to_lsp_edit(edit, text))
        .collect();

    if !edits.is_empty() {
        let mut changes = HashMap::new();
        changes.insert(uri.clone(), edits);

        let action = CodeAction {
            title: "Fix all lintbridge issues".to_string(),
            kind: Some(CodeActionKind::SOURCE_FIX_ALL),
            edit: Some(WorkspaceEdit {
                changes: Some(changes),
                ..Default::default()
            }),
            ..Default::default()
        };
        actions.push(CodeActionOrCommand::CodeAction(action));
    }
}
