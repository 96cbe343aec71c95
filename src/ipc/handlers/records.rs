use crate::collections::records;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    collection_err, get_opt_score, get_origin, get_required_index, get_required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{NewRecord, PaperAttachment, RecordPatch};
use crate::papers;
use crate::table;
use serde_json::json;
use std::path::Path;

fn parse_new_record(params: &serde_json::Value) -> Result<NewRecord, String> {
    Ok(NewRecord {
        student_email: get_required_str(params, "studentEmail")?,
        subject: get_required_str(params, "subject")?,
        category: get_required_str(params, "category")?,
        score: get_opt_score(params, "score")?,
        paper: None,
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, json!({ "records": records::list(store) }))
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input = match parse_new_record(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let origin = get_origin(&req.params);

    match records::add(store, &mut state.bus, origin.as_deref(), input) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => collection_err(&req.id, e),
    }
}

fn handle_upload_paper(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(store), Some(workspace)) = (state.store.as_mut(), state.workspace.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input = match parse_new_record(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let paper_path = match get_required_str(&req.params, "paperPath") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let origin = get_origin(&req.params);

    // Validate the owning record before touching the file so a rejected
    // upload stores nothing.
    if let Err(e) = records::validate_new(store, &input) {
        return collection_err(&req.id, e);
    }
    let stored = match papers::ingest(workspace, Path::new(&paper_path)) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "paper_ingest_failed", e.to_string(), None),
    };

    let input = NewRecord {
        paper: Some(PaperAttachment {
            name: stored.name,
            content_ref: stored.content_ref,
        }),
        ..input
    };
    match records::add(store, &mut state.bus, origin.as_deref(), input) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => collection_err(&req.id, e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let index = match get_required_index(&req.params, "index") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let Some(patch_params) = req.params.get("patch") else {
        return err(&req.id, "bad_params", "missing patch", None);
    };
    let patch = RecordPatch {
        student_email: match get_required_str(patch_params, "studentEmail") {
            Ok(v) => v,
            Err(m) => return err(&req.id, "bad_params", m, None),
        },
        subject: match get_required_str(patch_params, "subject") {
            Ok(v) => v,
            Err(m) => return err(&req.id, "bad_params", m, None),
        },
        category: match get_required_str(patch_params, "category") {
            Ok(v) => v,
            Err(m) => return err(&req.id, "bad_params", m, None),
        },
        score: match get_opt_score(patch_params, "score") {
            Ok(v) => v,
            Err(m) => return err(&req.id, "bad_params", m, None),
        },
    };
    let origin = get_origin(&req.params);

    match records::update(store, &mut state.bus, origin.as_deref(), index, patch) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => collection_err(&req.id, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let index = match get_required_index(&req.params, "index") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let origin = get_origin(&req.params);

    match records::remove(store, &mut state.bus, origin.as_deref(), index) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => collection_err(&req.id, e),
    }
}

/// Deletes by display-order row index. The display→storage translation is
/// recomputed against the collection length at action time, so a stale
/// index from an outdated render deletes nothing rather than the wrong
/// row.
fn handle_delete_at(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let display_index = match get_required_index(&req.params, "displayIndex") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let origin = get_origin(&req.params);

    let len = records::list(store).len();
    let Some(index) = table::storage_index(len, display_index) else {
        return err(&req.id, "bad_params", "displayIndex out of range", None);
    };
    match records::remove(store, &mut state.bus, origin.as_deref(), index) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => collection_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.list" => Some(handle_list(state, req)),
        "records.add" => Some(handle_add(state, req)),
        "records.uploadPaper" => Some(handle_upload_paper(state, req)),
        "records.update" => Some(handle_update(state, req)),
        "records.delete" => Some(handle_delete(state, req)),
        "records.deleteAt" => Some(handle_delete_at(state, req)),
        _ => None,
    }
}
