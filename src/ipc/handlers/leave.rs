use crate::calc;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{leave_json, require_role, required_date, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{LeaveStatus, Role};
use chrono::Utc;
use serde_json::json;

fn leave_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let user = require_role(state, &[Role::Staff])?;
    let store = &state.store;
    let mine: Vec<serde_json::Value> = store
        .leave_requests()
        .iter()
        .filter(|l| l.staff_id == user.id)
        .map(|l| leave_json(store, l))
        .collect();
    Ok(json!({
        "requests": mine,
        "counts": calc::leave_counts(store.leave_requests(), Some(user.id.as_str())),
        "profile": store.staff_profile(&user.id),
    }))
}

fn leave_submit(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = require_role(state, &[Role::Staff])?;
    let start_date = required_date(params, "startDate")?;
    let end_date = required_date(params, "endDate")?;
    let reason = required_str(params, "reason")?;
    if end_date < start_date {
        return Err(HandlerErr::bad_params("endDate must not be before startDate"));
    }

    let (next, leave_id) = state
        .store
        .submit_leave(&user.id, start_date, end_date, &reason, Utc::now());
    state.store = next;
    tracing::info!(leave_id = %leave_id, staff_id = %user.id, "leave request submitted");
    Ok(json!({
        "leaveId": leave_id,
        "status": LeaveStatus::Pending,
        "days": calc::leave_days(start_date, end_date),
    }))
}

fn leave_pending(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, &[Role::Admin])?;
    let store = &state.store;
    let pending: Vec<serde_json::Value> = store
        .leave_requests()
        .iter()
        .filter(|l| l.status == LeaveStatus::Pending)
        .map(|l| leave_json(store, l))
        .collect();
    Ok(json!({ "requests": pending }))
}

fn leave_decide(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = require_role(state, &[Role::Admin])?;
    let leave_id = required_str(params, "leaveId")?;
    let raw = required_str(params, "status")?;
    let decision = match LeaveStatus::parse(&raw) {
        Some(s @ (LeaveStatus::Approved | LeaveStatus::Rejected)) => s,
        _ => {
            return Err(HandlerErr::bad_params("status must be approved or rejected")
                .with_details(json!({ "allowed": ["approved", "rejected"] })))
        }
    };

    state.store = state.store.decide_leave(&leave_id, decision)?;
    tracing::info!(leave_id = %leave_id, decided_by = %user.id, status = %raw, "leave request decided");
    Ok(json!({ "leaveId": leave_id, "status": decision }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "leave.list" => leave_list(state),
        "leave.submit" => leave_submit(state, &req.params),
        "leave.pending" => leave_pending(state),
        "leave.decide" => leave_decide(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
