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
fn exported_bundle_restores_collections_and_papers_elsewhere() {
    let source_ws = temp_dir("scoresafe-backup-src");
    let restore_ws = temp_dir("scoresafe-backup-dst");
    let bundle = source_ws.join("backup.ssbackup.zip");
    let upload = source_ws.join("scan.pdf");
    std::fs::write(&upload, b"scan bytes").expect("write upload");

    // Populate the source workspace.
    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": source_ws.to_string_lossy() }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "students.add",
            json!({ "email": "a@example.com", "name": "A" }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "subjects.add",
            json!({ "name": "Math" }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "records.uploadPaper",
            json!({
                "studentEmail": "a@example.com",
                "subject": "Math",
                "category": "Quiz",
                "score": 82,
                "paperPath": upload.to_string_lossy()
            }),
        );
        let exported = request_ok(
            &mut stdin,
            &mut reader,
            "5",
            "backup.exportBundle",
            json!({ "outPath": bundle.to_string_lossy() }),
        );
        assert_eq!(
            exported.get("bundleFormat").and_then(|v| v.as_str()),
            Some("scoresafe-workspace-v1")
        );
        assert_eq!(exported.get("paperCount").and_then(|v| v.as_u64()), Some(1));
    }

    // Import into a fresh workspace and verify the store round-trips.
    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": restore_ws.to_string_lossy() }),
        );
        let imported = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "backup.importBundle",
            json!({ "inPath": bundle.to_string_lossy() }),
        );
        assert_eq!(imported.get("paperCount").and_then(|v| v.as_u64()), Some(1));

        let listed = request_ok(&mut stdin, &mut reader, "3", "records.list", json!({}));
        let records = listed
            .get("records")
            .and_then(|v| v.as_array())
            .expect("records array");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("score").and_then(|v| v.as_f64()), Some(82.0));
        let paper_ref = records[0]
            .get("paperRef")
            .and_then(|v| v.as_str())
            .expect("paperRef")
            .to_string();

        let fetched_to = restore_ws.join("restored.pdf");
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "papers.fetch",
            json!({ "ref": paper_ref, "outPath": fetched_to.to_string_lossy() }),
        );
        assert_eq!(std::fs::read(&fetched_to).expect("read"), b"scan bytes");

        let stats = request_ok(&mut stdin, &mut reader, "5", "dashboard.stats", json!({}));
        assert_eq!(stats.get("totalStudents").and_then(|v| v.as_u64()), Some(1));
        assert_eq!(stats.get("totalSubjects").and_then(|v| v.as_u64()), Some(1));
        assert_eq!(stats.get("totalRecords").and_then(|v| v.as_u64()), Some(1));
    }

    let _ = std::fs::remove_dir_all(source_ws);
    let _ = std::fs::remove_dir_all(restore_ws);
}

#[test]
fn import_rejects_a_foreign_bundle() {
    let workspace = temp_dir("scoresafe-backup-foreign");
    let bogus = workspace.join("not-a-bundle.zip");
    std::fs::write(&bogus, b"definitely not a zip").expect("write bogus");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let imported = request(
        &mut stdin,
        &mut reader,
        "2",
        "backup.importBundle",
        json!({ "inPath": bogus.to_string_lossy() }),
    );
    assert_eq!(imported.get("ok").and_then(|v| v.as_bool()), Some(false));

    // The daemon reopens its store and keeps serving.
    let _ = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));

    let _ = std::fs::remove_dir_all(workspace);
}
