use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = &state.store;
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "authenticated": state.session.is_some(),
            "counts": {
                "users": store.users().len(),
                "students": store.students().len(),
                "attendance": store.attendance().len(),
                "examResults": store.exam_results().len(),
                "notifications": store.notifications().len(),
                "leaveRequests": store.leave_requests().len(),
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
