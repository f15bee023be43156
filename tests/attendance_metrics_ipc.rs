use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .env("SCHOOLD_SEED", "demo")
        .env("SCHOOLD_TODAY", "2024-02-09")
        .env("SCHOOLD_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
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

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn login(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, email: &str, password: &str) {
    let _ = request_ok(
        stdin,
        reader,
        &format!("login-{}", email),
        "session.login",
        json!({ "email": email, "password": password }),
    );
}

#[test]
fn marking_attendance_updates_summary_with_upsert() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "admin@teckish.edu", "admin123");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "name": "Nina Patel", "rollNumber": "TCK2024100", "grade": "7-C" }),
    );
    let sid = created["studentId"].as_str().expect("studentId").to_string();

    let empty = request_ok(&mut stdin, &mut reader, "2", "attendance.summary", json!({ "studentId": sid }));
    assert_eq!(
        empty["summary"],
        json!({ "present": 0, "absent": 0, "late": 0, "total": 0, "percentage": 0 })
    );

    for (id, date, status) in [
        ("3", "2024-02-05", "present"),
        ("4", "2024-02-06", "present"),
        ("5", "2024-02-07", "late"),
    ] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "attendance.mark",
            json!({ "studentId": sid, "date": date, "status": status }),
        );
    }
    // Re-marking a day replaces the earlier status.
    let marked = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.mark",
        json!({ "studentId": sid, "date": "2024-02-07", "status": "absent" }),
    );
    assert_eq!(
        marked["summary"],
        json!({ "present": 2, "absent": 1, "late": 0, "total": 3, "percentage": 67 })
    );

    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.mark",
        json!({ "studentId": sid, "date": "2024-02-08", "status": "excused" }),
    );
    assert_eq!(code, "bad_params");
    let code = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "attendance.mark",
        json!({ "studentId": "student-404", "date": "2024-02-08", "status": "present" }),
    );
    assert_eq!(code, "not_found");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn average_grade_uses_percent_of_max_score() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "teacher1@teckish.edu", "staff123");

    let seeded = request_ok(&mut stdin, &mut reader, "1", "results.averageGrade", json!({ "studentId": "student-1" }));
    assert_eq!(seeded["averageGrade"], 86);
    assert_eq!(seeded["gradeBand"], "A");

    let none = request_ok(&mut stdin, &mut reader, "2", "results.averageGrade", json!({ "studentId": "student-404" }));
    assert_eq!(none["averageGrade"], 0);

    // student-2 starts at (72 + 88 + 76 + 95) / 4 = 82.75; a 45/50 quiz adds 90%.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "results.add",
        json!({
            "studentId": "student-2",
            "subject": "Mathematics",
            "score": "45",
            "maxScore": 50,
            "examDate": "2024-02-09",
            "examType": "Quiz"
        }),
    );
    let after = request_ok(&mut stdin, &mut reader, "4", "results.averageGrade", json!({ "studentId": "student-2" }));
    assert_eq!(after["averageGrade"], 84);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "results.add",
        json!({
            "studentId": "student-2",
            "subject": "Mathematics",
            "score": 10,
            "maxScore": 0,
            "examDate": "2024-02-09",
            "examType": "Quiz"
        }),
    );
    assert_eq!(code, "bad_params");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn day_view_filters_by_grade_and_counts_are_consistent() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login(&mut stdin, &mut reader, "teacher2@teckish.edu", "staff123");

    let day = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.day",
        json!({ "date": "2024-02-09", "grade": "10-A" }),
    );
    let roster = day["roster"].as_array().expect("roster");
    let ids: Vec<&str> = roster.iter().filter_map(|r| r["studentId"].as_str()).collect();
    assert_eq!(ids, vec!["student-1", "student-3"]);
    assert_eq!(day["stats"]["studentCount"], 2);
    assert_eq!(day["stats"]["present"], 1);
    assert_eq!(day["stats"]["absent"], 1);
    assert_eq!(day["stats"]["rate"], 50);

    let weekend = request_ok(&mut stdin, &mut reader, "2", "attendance.day", json!({ "date": "2024-02-10" }));
    assert_eq!(weekend["stats"]["unmarked"], 5);
    assert_eq!(weekend["stats"]["rate"], 0);

    for (i, sid) in ["student-1", "student-2", "student-3", "student-4", "student-5"].iter().enumerate() {
        let id = format!("s{}", i);
        let res = request_ok(&mut stdin, &mut reader, &id, "attendance.summary", json!({ "studentId": sid }));
        let s = &res["summary"];
        let present = s["present"].as_u64().expect("present");
        let absent = s["absent"].as_u64().expect("absent");
        let late = s["late"].as_u64().expect("late");
        let total = s["total"].as_u64().expect("total");
        assert_eq!(present + absent + late, total, "{}", sid);
        assert_eq!(total, 22, "{}", sid);
        let pct = s["percentage"].as_u64().expect("percentage");
        assert!(pct <= 100);
    }

    drop(stdin);
    let _ = child.wait();
}
