use crate::collections::students;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{collection_err, get_origin, get_required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, json!({ "students": students::list(store) }))
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let email = match get_required_str(&req.params, "email") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let name = match get_required_str(&req.params, "name") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let origin = get_origin(&req.params);

    match students::add(store, &mut state.bus, origin.as_deref(), &email, &name) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => collection_err(&req.id, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let email = match get_required_str(&req.params, "email") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let origin = get_origin(&req.params);

    match students::remove(store, &mut state.bus, origin.as_deref(), &email) {
        Ok(summary) => ok(
            &req.id,
            json!({ "removed": true, "removedRecords": summary.removed_records }),
        ),
        Err(e) => collection_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.add" => Some(handle_add(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
