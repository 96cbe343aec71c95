use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_scoresafed");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn scoresafed");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn student_overview_shows_only_that_students_records_newest_first() {
    let workspace = temp_dir("scoresafe-student-overview");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    for (id, email, name) in [
        ("2", "a@example.com", "A"),
        ("3", "b@example.com", "B"),
    ] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "students.add",
            json!({ "email": email, "name": name }),
        );
    }
    for (id, name) in [("4", "Math"), ("5", "Science")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "subjects.add",
            json!({ "name": name }),
        );
    }
    for (id, email, subject, score) in [
        ("6", "a@example.com", "Math", 40),
        ("7", "b@example.com", "Math", 50),
        ("8", "a@example.com", "Science", 60),
        ("9", "a@example.com", "Math", 70),
    ] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "records.add",
            json!({
                "studentEmail": email,
                "subject": subject,
                "category": "Quiz",
                "score": score
            }),
        );
    }

    let overview = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "student.overview",
        json!({ "email": "a@example.com" }),
    );
    assert_eq!(overview.get("totalScores").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(
        overview.get("totalSubjects").and_then(|v| v.as_u64()),
        Some(2),
        "distinct subjects, not record count"
    );
    let scores: Vec<f64> = overview
        .get("records")
        .and_then(|v| v.as_array())
        .expect("records array")
        .iter()
        .filter_map(|r| r.get("score").and_then(|v| v.as_f64()))
        .collect();
    assert_eq!(scores, vec![70.0, 60.0, 40.0], "newest first, b@ filtered out");

    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "student.overview",
        json!({ "email": "nobody@example.com" }),
    );
    assert_eq!(empty.get("totalScores").and_then(|v| v.as_u64()), Some(0));

    let _ = std::fs::remove_dir_all(workspace);
}
