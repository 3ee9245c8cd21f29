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

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_starclassd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn starclassd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    caller: Option<&str>,
    params: serde_json::Value,
) -> serde_json::Value {
    let mut payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    if let Some(c) = caller {
        payload["caller"] = json!(c);
    }
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn result(resp: &serde_json::Value) -> &serde_json::Value {
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "expected success, got {resp}"
    );
    resp.get("result").expect("result")
}

fn error_code(resp: &serde_json::Value) -> &str {
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "expected failure, got {resp}"
    );
    resp.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .expect("error code")
}

struct Fixture {
    class_id: String,
    student_id: String,
    log_id: String,
}

/// teacher-1 owns a class with one student and one +5 log; parent-1 holds a
/// PARENT membership on it.
fn seed(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, workspace: &PathBuf) -> Fixture {
    let _ = request(
        stdin,
        reader,
        "seed-1",
        "workspace.select",
        None,
        json!({ "path": workspace.to_string_lossy() }),
    );
    let created = request(
        stdin,
        reader,
        "seed-2",
        "classes.create",
        Some("teacher-1"),
        json!({ "name": "5A", "teacherName": "Ms. X" }),
    );
    let class_id = result(&created)
        .get("id")
        .and_then(|v| v.as_str())
        .expect("class id")
        .to_string();
    let alice = request(
        stdin,
        reader,
        "seed-3",
        "students.create",
        Some("teacher-1"),
        json!({ "classId": class_id, "name": "Alice" }),
    );
    let student_id = result(&alice)
        .get("id")
        .and_then(|v| v.as_str())
        .expect("student id")
        .to_string();
    let logged = request(
        stdin,
        reader,
        "seed-4",
        "logs.record",
        Some("teacher-1"),
        json!({
            "classId": class_id,
            "studentId": student_id,
            "behaviorLabel": "homework",
            "value": 5
        }),
    );
    let log_id = result(&logged)
        .get("logs")
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
        .and_then(|l| l.get("id"))
        .and_then(|v| v.as_str())
        .expect("log id")
        .to_string();
    let _ = request(
        stdin,
        reader,
        "seed-5",
        "user.updateProfile",
        Some("parent-1"),
        json!({ "joinClass": { "classId": class_id, "role": "PARENT", "alias": "Mum of Alice" } }),
    );
    Fixture {
        class_id,
        student_id,
        log_id,
    }
}

#[test]
fn missing_caller_is_unauthorized() {
    let workspace = temp_dir("starclass-unauthorized");
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        None,
        json!({ "path": workspace.to_string_lossy() }),
    );
    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        None,
        json!({ "name": "5A", "teacherName": "Ms. X" }),
    );
    assert_eq!(error_code(&resp), "unauthorized");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn parent_cannot_delete_students_or_undo_logs() {
    let workspace = temp_dir("starclass-parent-denied");
    let (mut child, mut stdin, mut reader) = spawn_daemon();
    let fx = seed(&mut stdin, &mut reader, &workspace);

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "students.delete",
        Some("parent-1"),
        json!({ "classId": fx.class_id, "studentId": fx.student_id }),
    );
    assert_eq!(error_code(&resp), "permission_denied");

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "logs.undo",
        Some("parent-1"),
        json!({ "classId": fx.class_id, "logId": fx.log_id }),
    );
    assert_eq!(error_code(&resp), "permission_denied");

    // Nothing changed.
    let fetched = request(
        &mut stdin,
        &mut reader,
        "3",
        "classes.detail",
        Some("parent-1"),
        json!({ "classId": fx.class_id }),
    );
    let detail = result(&fetched);
    let students = detail
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students");
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].get("score").and_then(|v| v.as_i64()), Some(5));
    assert_eq!(
        detail.get("logs").and_then(|v| v.as_array()).map(Vec::len),
        Some(1)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn parent_leaves_instead_of_dissolving() {
    let workspace = temp_dir("starclass-parent-leave");
    let (mut child, mut stdin, mut reader) = spawn_daemon();
    let fx = seed(&mut stdin, &mut reader, &workspace);

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "classes.dissolveOrLeave",
        Some("parent-1"),
        json!({ "classId": fx.class_id }),
    );
    assert_eq!(result(&resp).get("left").and_then(|v| v.as_bool()), Some(true));

    // The class and its data survive a member leaving.
    let fetched = request(
        &mut stdin,
        &mut reader,
        "2",
        "classes.detail",
        Some("teacher-1"),
        json!({ "classId": fx.class_id }),
    );
    assert_eq!(
        result(&fetched)
            .get("students")
            .and_then(|v| v.as_array())
            .map(Vec::len),
        Some(1)
    );

    // parent-1 is no longer a member.
    let listed = request(
        &mut stdin,
        &mut reader,
        "3",
        "classes.listMine",
        Some("parent-1"),
        json!({}),
    );
    assert_eq!(
        result(&listed)
            .get("classes")
            .and_then(|v| v.as_array())
            .map(Vec::len),
        Some(0)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn non_member_cannot_dissolve_or_leave() {
    let workspace = temp_dir("starclass-non-member");
    let (mut child, mut stdin, mut reader) = spawn_daemon();
    let fx = seed(&mut stdin, &mut reader, &workspace);

    // stranger-1 has a user row but no membership on the class.
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "user.updateProfile",
        Some("stranger-1"),
        json!({ "name": "Stranger" }),
    );
    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "classes.dissolveOrLeave",
        Some("stranger-1"),
        json!({ "classId": fx.class_id }),
    );
    assert_eq!(error_code(&resp), "not_found");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
