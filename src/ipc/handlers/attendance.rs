use crate::calc;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{optional_filter, require_role, required_date, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, Role};
use serde_json::json;

const MARKERS: &[Role] = &[Role::Admin, Role::Staff];

fn parse_status(raw: &str) -> Result<AttendanceStatus, HandlerErr> {
    AttendanceStatus::parse(raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("unknown attendance status: {}", raw))
            .with_details(json!({ "allowed": ["present", "absent", "late"] }))
    })
}

fn attendance_summary(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, MARKERS)?;
    let student_id = required_str(params, "studentId")?;
    // Unknown students get an all-zero summary.
    let summary = calc::attendance_summary(state.store.attendance(), &student_id);
    Ok(json!({ "studentId": student_id, "summary": summary }))
}

fn attendance_day(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, MARKERS)?;
    let date = required_date(params, "date")?;
    let grade = optional_filter(params, "grade")?;
    let store = &state.store;

    let roster: Vec<serde_json::Value> = calc::students_in_grade(store.students(), grade.as_deref())
        .into_iter()
        .map(|s| {
            json!({
                "studentId": s.id,
                "name": s.name,
                "rollNumber": s.roll_number,
                "grade": s.grade,
                "status": calc::status_on(store.attendance(), &s.id, date),
            })
        })
        .collect();
    let stats = calc::day_attendance(store.students(), store.attendance(), date, grade.as_deref());

    Ok(json!({
        "date": date,
        "grade": grade,
        "stats": stats,
        "roster": roster,
    }))
}

fn attendance_mark(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = require_role(state, MARKERS)?;
    let student_id = required_str(params, "studentId")?;
    let date = required_date(params, "date")?;
    let status = parse_status(&required_str(params, "status")?)?;
    if state.store.student(&student_id).is_none() {
        return Err(HandlerErr::new("not_found", "student not found"));
    }

    state.store = state.store.mark_attendance(&student_id, date, status);
    tracing::info!(
        student_id = %student_id,
        %date,
        status = status.as_str(),
        marked_by = %user.id,
        "attendance marked"
    );
    Ok(json!({
        "studentId": student_id,
        "date": date,
        "status": status,
        "summary": calc::attendance_summary(state.store.attendance(), &student_id),
    }))
}

fn attendance_grades(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, MARKERS)?;
    let grades = calc::distinct(state.store.students().iter().map(|s| s.grade.as_str()));
    Ok(json!({ "grades": grades }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.summary" => attendance_summary(state, &req.params),
        "attendance.day" => attendance_day(state, &req.params),
        "attendance.mark" => attendance_mark(state, &req.params),
        "attendance.grades" => attendance_grades(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
