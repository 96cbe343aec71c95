use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::model::{RECORDS_KEY, STUDENTS_KEY, SUBJECTS_KEY};
use crate::store;
use serde_json::json;
use std::path::Path;

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let out_path = match get_required_str(&req.params, "outPath") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    match backup::export_workspace_bundle(workspace, Path::new(&out_path)) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "paperCount": summary.paper_count,
            }),
        ),
        Err(e) => err(&req.id, "export_failed", format!("{e:?}"), None),
    }
}

fn handle_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let in_path = match get_required_str(&req.params, "inPath") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    // The open connection would keep serving the replaced file; drop it
    // for the duration of the import and reopen over the imported store.
    state.store = None;
    let summary = match backup::import_workspace_bundle(Path::new(&in_path), &workspace) {
        Ok(v) => v,
        Err(e) => {
            state.store = store::open_store(&workspace).ok();
            return err(&req.id, "import_failed", format!("{e:?}"), None);
        }
    };
    let reopened = match store::open_store(&workspace) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "store_open_failed", format!("{e:?}"), None),
    };
    state.store = Some(reopened);

    // Every collection may have changed; wake all views.
    if let Some(s) = state.store.as_mut() {
        let _ = state
            .bus
            .publish(s, None, &[STUDENTS_KEY, SUBJECTS_KEY, RECORDS_KEY]);
    }

    ok(
        &req.id,
        json!({
            "bundleFormatDetected": summary.bundle_format_detected,
            "paperCount": summary.paper_count,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportBundle" => Some(handle_export(state, req)),
        "backup.importBundle" => Some(handle_import(state, req)),
        _ => None,
    }
}
