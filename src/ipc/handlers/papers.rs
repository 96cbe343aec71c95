use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_opt_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::papers;
use serde_json::json;
use std::path::Path;

/// Resolves a stored paper by content reference, optionally copying it to
/// a caller-supplied output path.
fn handle_fetch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let content_ref = match get_required_str(&req.params, "ref") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    let result = match get_opt_str(&req.params, "outPath") {
        Some(out_path) => papers::fetch_to(workspace, &content_ref, Path::new(&out_path)),
        None => papers::resolve(workspace, &content_ref),
    };
    match result {
        Ok(path) => ok(&req.id, json!({ "path": path.to_string_lossy() })),
        Err(e) => err(&req.id, "paper_not_found", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "papers.fetch" => Some(handle_fetch(state, req)),
        _ => None,
    }
}
