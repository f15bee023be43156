use crate::calc;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    optional_date, optional_str, require_role, required_str, result_json, student_row_json,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::store::{NewStudent, StudentPatch};
use serde_json::json;

const VIEWERS: &[Role] = &[Role::Admin, Role::Staff];
const EDITORS: &[Role] = &[Role::Admin];

fn students_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, VIEWERS)?;
    let query = optional_str(params, "query")?.unwrap_or_default();
    let store = &state.store;
    let rows: Vec<serde_json::Value> = calc::search_students(store.students(), &query)
        .into_iter()
        .map(|s| student_row_json(store, s))
        .collect();
    Ok(json!({ "students": rows }))
}

fn students_get(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, VIEWERS)?;
    let student_id = required_str(params, "studentId")?;
    let store = &state.store;
    let Some(student) = store.student(&student_id) else {
        return Err(HandlerErr::new("not_found", "student not found"));
    };
    let results: Vec<serde_json::Value> = store
        .exam_results()
        .iter()
        .filter(|r| r.student_id == student_id)
        .map(|r| result_json(store, r))
        .collect();
    let mut body = student_row_json(store, student);
    body["results"] = json!(results);
    body["parent"] = json!(store.user(&student.parent_id).map(|u| u.name.as_str()));
    Ok(body)
}

fn students_overview(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, VIEWERS)?;
    let store = &state.store;
    Ok(json!({
        "count": store.students().len(),
        "averageAttendance": calc::mean_attendance_percentage(store.students(), store.attendance()),
        "averageGrade": calc::mean_average_grade(store.students(), store.exam_results()),
        "grades": calc::distinct(store.students().iter().map(|s| s.grade.as_str())),
    }))
}

fn students_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, EDITORS)?;
    let new = NewStudent {
        name: required_str(params, "name")?,
        roll_number: required_str(params, "rollNumber")?,
        grade: required_str(params, "grade")?,
        parent_id: optional_str(params, "parentId")?.unwrap_or_default(),
        date_of_birth: optional_date(params, "dateOfBirth")?,
        email: optional_str(params, "email")?.unwrap_or_default(),
        phone: optional_str(params, "phone")?.unwrap_or_default(),
    };
    let (next, student_id) = state.store.add_student(new);
    state.store = next;
    tracing::info!(student_id = %student_id, "student added");
    Ok(json!({ "studentId": student_id }))
}

fn patch_field(patch: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match patch.get(key) {
        None => Ok(None),
        Some(_) => required_str(patch, key).map(Some),
    }
}

fn students_update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, EDITORS)?;
    let student_id = required_str(params, "studentId")?;
    let Some(patch) = params.get("patch").filter(|p| p.is_object()) else {
        return Err(HandlerErr::bad_params("patch must be an object"));
    };
    let patch = StudentPatch {
        name: patch_field(patch, "name")?,
        roll_number: patch_field(patch, "rollNumber")?,
        grade: patch_field(patch, "grade")?,
        parent_id: patch_field(patch, "parentId")?,
        date_of_birth: optional_date(patch, "dateOfBirth")?,
        email: optional_str(patch, "email")?,
        phone: optional_str(patch, "phone")?,
    };
    state.store = state.store.update_student(&student_id, patch)?;
    tracing::info!(student_id = %student_id, "student updated");
    Ok(json!({ "ok": true }))
}

fn students_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, EDITORS)?;
    let student_id = required_str(params, "studentId")?;
    state.store = state.store.remove_student(&student_id)?;
    tracing::info!(student_id = %student_id, "student removed");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state, &req.params),
        "students.get" => students_get(state, &req.params),
        "students.overview" => students_overview(state),
        "students.create" => students_create(state, &req.params),
        "students.update" => students_update(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
