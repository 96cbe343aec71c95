use crate::collections::{records, students, subjects};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::model::Record;
use serde_json::json;
use std::collections::HashSet;

fn handle_dashboard_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(
        &req.id,
        json!({
            "totalRecords": records::list(store).len(),
            "totalStudents": students::list(store).len(),
            "totalSubjects": subjects::list(store).len(),
        }),
    )
}

/// The student-facing view: that student's records in display order plus
/// the counts their dashboard shows.
fn handle_student_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let email = match get_required_str(&req.params, "email") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    let mine: Vec<Record> = records::list(store)
        .into_iter()
        .filter(|r| r.student_email == email)
        .collect();
    let distinct_subjects: HashSet<&str> = mine.iter().map(|r| r.subject.as_str()).collect();

    let display: Vec<&Record> = mine.iter().rev().collect();
    ok(
        &req.id,
        json!({
            "records": display,
            "totalScores": mine.len(),
            "totalSubjects": distinct_subjects.len(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.stats" => Some(handle_dashboard_stats(state, req)),
        "student.overview" => Some(handle_student_overview(state, req)),
        _ => None,
    }
}
