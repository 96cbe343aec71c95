use crate::collections::subjects;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{collection_err, get_origin, get_required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, json!({ "subjects": subjects::list(store) }))
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match get_required_str(&req.params, "name") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let origin = get_origin(&req.params);

    match subjects::add(store, &mut state.bus, origin.as_deref(), &name) {
        Ok(subject) => ok(&req.id, json!({ "subject": subject })),
        Err(e) => collection_err(&req.id, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match get_required_str(&req.params, "name") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let origin = get_origin(&req.params);

    match subjects::remove(store, &mut state.bus, origin.as_deref(), &name) {
        Ok(summary) => ok(
            &req.id,
            json!({ "removed": true, "removedRecords": summary.removed_records }),
        ),
        Err(e) => collection_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_list(state, req)),
        "subjects.add" => Some(handle_add(state, req)),
        "subjects.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
