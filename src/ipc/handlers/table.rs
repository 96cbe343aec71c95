use crate::collections::records;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{collection_err, get_opt_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::Record;
use crate::table::{self, EditError, RowState};
use serde_json::json;

fn edit_err(id: &str, e: EditError) -> serde_json::Value {
    let code = match &e {
        EditError::NotEditing => "not_editing",
        EditError::UnknownField(_) => "bad_params",
        EditError::BadScore(_) => "validation_failed",
    };
    err(id, code, e.to_string(), None)
}

fn draft_json(draft: &table::RowDraft) -> serde_json::Value {
    json!({
        "studentEmail": draft.student_email,
        "subject": draft.subject,
        "category": draft.category,
        "score": draft.score,
    })
}

/// Renders the score table for a view: display order is reverse insertion
/// order, each row carrying its record and edit state.
fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let view = match get_required_str(&req.params, "view") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let email = get_opt_str(&req.params, "email");

    let all = records::list(store);
    let session = state.tables.entry(view).or_default();
    session.prune(&all);

    let visible: Vec<Record> = match email {
        Some(ref email) => all
            .iter()
            .filter(|r| &r.student_email == email)
            .cloned()
            .collect(),
        None => all,
    };

    let rows: Vec<serde_json::Value> = table::rows(session, &visible)
        .into_iter()
        .map(|row| match row.state {
            RowState::Viewing => json!({
                "displayIndex": row.display_index,
                "record": row.record,
                "state": "viewing",
            }),
            RowState::Editing(draft) => json!({
                "displayIndex": row.display_index,
                "record": row.record,
                "state": "editing",
                "draft": draft_json(&draft),
            }),
        })
        .collect();

    ok(&req.id, json!({ "rows": rows }))
}

fn handle_begin_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let view = match get_required_str(&req.params, "view") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let record_id = match get_required_str(&req.params, "recordId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    let all = records::list(store);
    let Some(record) = all.iter().find(|r| r.id == record_id) else {
        return err(&req.id, "not_found", "record not found", None);
    };

    let session = state.tables.entry(view).or_default();
    let draft = session.begin_edit(record);
    ok(&req.id, json!({ "draft": draft_json(&draft) }))
}

fn handle_set_field(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match get_required_str(&req.params, "view") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let record_id = match get_required_str(&req.params, "recordId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let field = match get_required_str(&req.params, "field") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let value = match get_required_str(&req.params, "value") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    let Some(session) = state.tables.get_mut(&view) else {
        return edit_err(&req.id, EditError::NotEditing);
    };
    match session.set_field(&record_id, &field, &value) {
        Ok(()) => ok(&req.id, json!({ "updated": true })),
        Err(e) => edit_err(&req.id, e),
    }
}

/// Commits a row edit: the draft resolves to a full-field patch applied at
/// the record's storage index, looked up by record id at commit time.
fn handle_commit_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let view = match get_required_str(&req.params, "view") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let record_id = match get_required_str(&req.params, "recordId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    let all = records::list(store);
    let Some(session) = state.tables.get_mut(&view) else {
        return edit_err(&req.id, EditError::NotEditing);
    };
    let Some(index) = records::find_index_by_id(&all, &record_id) else {
        // The record was deleted while the row was in Editing.
        session.cancel(&record_id);
        return err(&req.id, "not_found", "record no longer exists", None);
    };
    let patch = match session.take_commit(&record_id) {
        Ok(p) => p,
        Err(e) => return edit_err(&req.id, e),
    };

    match records::update(store, &mut state.bus, Some(view.as_str()), index, patch) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => collection_err(&req.id, e),
    }
}

fn handle_cancel_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match get_required_str(&req.params, "view") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let record_id = match get_required_str(&req.params, "recordId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    let cancelled = state
        .tables
        .get_mut(&view)
        .map(|session| session.cancel(&record_id))
        .unwrap_or(false);
    ok(&req.id, json!({ "cancelled": cancelled }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "table.open" => Some(handle_open(state, req)),
        "table.beginEdit" => Some(handle_begin_edit(state, req)),
        "table.setField" => Some(handle_set_field(state, req)),
        "table.commitEdit" => Some(handle_commit_edit(state, req)),
        "table.cancelEdit" => Some(handle_cancel_edit(state, req)),
        _ => None,
    }
}
