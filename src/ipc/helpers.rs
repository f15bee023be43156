use chrono::NaiveDate;
use serde_json::json;

use crate::calc;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::model::{ExamResult, LeaveRequest, Role, Student, User};
use crate::store::Store;

pub fn required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    let Some(s) = v.as_str() else {
        return Err(HandlerErr::bad_params(format!("{} must be a string", key)));
    };
    let t = s.trim();
    if t.is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    Ok(t.to_string())
}

/// Missing, null and blank all read as `None`.
pub fn optional_str(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let Some(s) = v.as_str() else {
                return Err(HandlerErr::bad_params(format!(
                    "{} must be string or null",
                    key
                )));
            };
            let t = s.trim();
            if t.is_empty() {
                Ok(None)
            } else {
                Ok(Some(t.to_string()))
            }
        }
    }
}

/// Like `optional_str`, but the UI's "all" sentinel also means no filter.
pub fn optional_filter(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    Ok(optional_str(params, key)?.filter(|v| !v.eq_ignore_ascii_case("all")))
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)))
}

pub fn required_date(params: &serde_json::Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = required_str(params, key)?;
    parse_date(key, &raw)
}

pub fn optional_date(params: &serde_json::Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    optional_str(params, key)?
        .map(|raw| parse_date(key, &raw))
        .transpose()
}

/// Accepts JSON numbers and numeric strings (form inputs arrive as text).
pub fn optional_f64(params: &serde_json::Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let parsed = match v {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match parsed {
                Some(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(HandlerErr::bad_params(format!("{} must be a number", key))),
            }
        }
    }
}

pub fn required_f64(params: &serde_json::Value, key: &str) -> Result<f64, HandlerErr> {
    optional_f64(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn parse_role(raw: &str) -> Result<Role, HandlerErr> {
    Role::parse(raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("unknown role: {}", raw))
            .with_details(json!({ "allowed": ["admin", "staff", "parent"] }))
    })
}

pub fn session_user(state: &AppState) -> Result<User, HandlerErr> {
    state
        .session
        .as_deref()
        .and_then(|id| state.store.user(id))
        .cloned()
        .ok_or_else(|| HandlerErr::new("not_authenticated", "log in first"))
}

pub fn require_role(state: &AppState, allowed: &[Role]) -> Result<User, HandlerErr> {
    let user = session_user(state)?;
    if !allowed.contains(&user.role) {
        return Err(HandlerErr::new(
            "forbidden",
            format!("{} role may not do this", user.role.as_str()),
        ));
    }
    Ok(user)
}

pub fn user_json(u: &User) -> serde_json::Value {
    json!({
        "id": u.id,
        "email": u.email,
        "name": u.name,
        "role": u.role,
        "avatar": u.avatar,
        "childIds": u.child_ids,
    })
}

pub fn student_row_json(store: &Store, s: &Student) -> serde_json::Value {
    let average = calc::average_grade(store.exam_results(), &s.id);
    json!({
        "student": s,
        "attendance": calc::attendance_summary(store.attendance(), &s.id),
        "averageGrade": average,
        "gradeBand": calc::grade_band(average),
    })
}

pub fn result_json(store: &Store, r: &ExamResult) -> serde_json::Value {
    let pct = calc::result_percentage(r);
    json!({
        "result": r,
        "studentName": store.student(&r.student_id).map(|s| s.name.as_str()),
        "percentage": pct,
        "gradeBand": calc::grade_band(pct),
    })
}

pub fn leave_json(store: &Store, l: &LeaveRequest) -> serde_json::Value {
    json!({
        "request": l,
        "staffName": store.user(&l.staff_id).map(|u| u.name.as_str()),
        "days": calc::leave_days(l.start_date, l.end_date),
    })
}
