use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match get_required_str(&req.params, "view") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    state.bus.register(&view);
    ok(&req.id, json!({ "registered": true }))
}

/// Drains the pending change hints for a view. Hints carry no payload;
/// the view re-reads each named collection and re-renders.
fn handle_poll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match get_required_str(&req.params, "view") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    if !state.bus.is_registered(&view) {
        return err(&req.id, "not_registered", "register the view first", None);
    }
    let events: Vec<serde_json::Value> = state
        .bus
        .drain(&view)
        .into_iter()
        .map(|e| json!({ "key": e.key }))
        .collect();
    ok(&req.id, json!({ "events": events }))
}

fn handle_unregister(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match get_required_str(&req.params, "view") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let unregistered = state.bus.unregister(&view);
    state.tables.remove(&view);
    ok(&req.id, json!({ "unregistered": unregistered }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "sync.register" => Some(handle_register(state, req)),
        "sync.poll" => Some(handle_poll(state, req)),
        "sync.unregister" => Some(handle_unregister(state, req)),
        _ => None,
    }
}
