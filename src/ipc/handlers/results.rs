use crate::calc::{self, ResultFilter};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    optional_f64, optional_filter, optional_str, require_role, required_date, required_f64,
    required_str, result_json,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::store::NewExamResult;
use serde_json::json;

const VIEWERS: &[Role] = &[Role::Admin, Role::Staff];
const DEFAULT_MAX_SCORE: f64 = 100.0;
const DEFAULT_TOP_LIMIT: usize = 3;

fn results_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, VIEWERS)?;
    let filter = ResultFilter {
        student_id: optional_filter(params, "studentId")?,
        subject: optional_filter(params, "subject")?,
        query: optional_str(params, "query")?,
    };
    let store = &state.store;
    let selected = calc::filter_results(store.exam_results(), store.students(), &filter);
    let rows: Vec<serde_json::Value> = selected.iter().map(|r| result_json(store, r)).collect();

    Ok(json!({
        "results": rows,
        "averageScore": calc::results_average(selected.iter().copied()),
        "bestPercentage": calc::best_result_percentage(store.exam_results()),
        "total": store.exam_results().len(),
    }))
}

fn results_add(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = require_role(state, VIEWERS)?;
    let student_id = required_str(params, "studentId")?;
    let subject = required_str(params, "subject")?;
    let score = required_f64(params, "score")?;
    let max_score = optional_f64(params, "maxScore")?.unwrap_or(DEFAULT_MAX_SCORE);
    let exam_date = required_date(params, "examDate")?;
    let exam_type = required_str(params, "examType")?;

    if max_score <= 0.0 {
        return Err(HandlerErr::bad_params("maxScore must be greater than 0"));
    }
    if score < 0.0 {
        return Err(HandlerErr::bad_params("score must not be negative"));
    }
    if state.store.student(&student_id).is_none() {
        return Err(HandlerErr::new("not_found", "student not found"));
    }

    let (next, result_id) = state.store.add_exam_result(NewExamResult {
        student_id: student_id.clone(),
        subject,
        score,
        max_score,
        exam_date,
        exam_type,
    });
    state.store = next;
    tracing::info!(result_id = %result_id, student_id = %student_id, recorded_by = %user.id, "exam result added");
    Ok(json!({
        "resultId": result_id,
        "averageGrade": calc::average_grade(state.store.exam_results(), &student_id),
    }))
}

fn results_average_grade(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, VIEWERS)?;
    let student_id = required_str(params, "studentId")?;
    let average = calc::average_grade(state.store.exam_results(), &student_id);
    Ok(json!({
        "studentId": student_id,
        "averageGrade": average,
        "gradeBand": calc::grade_band(average),
    }))
}

fn results_top_performers(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, VIEWERS)?;
    let limit = match params.get("limit") {
        None => DEFAULT_TOP_LIMIT,
        Some(v) if v.is_null() => DEFAULT_TOP_LIMIT,
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| HandlerErr::bad_params("limit must be a non-negative integer"))?,
    };
    let store = &state.store;
    let performers = calc::top_performers(store.students(), store.exam_results(), limit);
    Ok(json!({ "performers": performers }))
}

fn results_subjects(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, VIEWERS)?;
    let store = &state.store;
    Ok(json!({
        "subjects": calc::distinct(store.exam_results().iter().map(|r| r.subject.as_str())),
        "examTypes": calc::distinct(store.exam_results().iter().map(|r| r.exam_type.as_str())),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "results.list" => results_list(state, &req.params),
        "results.add" => results_add(state, &req.params),
        "results.averageGrade" => results_average_grade(state, &req.params),
        "results.topPerformers" => results_top_performers(state, &req.params),
        "results.subjects" => results_subjects(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
