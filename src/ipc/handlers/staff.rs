use crate::calc;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{require_role, user_json};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

fn staff_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, &[Role::Admin])?;
    let store = &state.store;
    let staff: Vec<serde_json::Value> = store
        .users()
        .iter()
        .filter(|u| u.role == Role::Staff)
        .map(|u| {
            json!({
                "user": user_json(u),
                "profile": store.staff_profile(&u.id),
                "leave": calc::leave_counts(store.leave_requests(), Some(u.id.as_str())),
            })
        })
        .collect();
    Ok(json!({
        "staff": staff,
        "pendingLeaves": calc::leave_counts(store.leave_requests(), None).pending,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "staff.list" => staff_list(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
