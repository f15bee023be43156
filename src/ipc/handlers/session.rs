use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{required_str, session_user, user_json};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn session_login(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = required_str(params, "email")?;
    // Passwords are compared as typed.
    let password = params
        .get("password")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing password"))?;

    let Some(user) = state.store.authenticate(&email, password).cloned() else {
        tracing::info!(email = %email, "login rejected");
        return Err(HandlerErr::new(
            "invalid_credentials",
            "Invalid email or password",
        ));
    };

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "login");
    state.session = Some(user.id.clone());
    Ok(json!({ "user": user_json(&user) }))
}

fn session_logout(state: &mut AppState) -> serde_json::Value {
    if let Some(id) = state.session.take() {
        tracing::info!(user_id = %id, "logout");
    }
    json!({ "loggedOut": true })
}

fn session_current(state: &AppState) -> serde_json::Value {
    match session_user(state) {
        Ok(user) => json!({ "user": user_json(&user) }),
        Err(_) => json!({ "user": null }),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "session.login" => session_login(state, &req.params),
        "session.logout" => Ok(session_logout(state)),
        "session.current" => Ok(session_current(state)),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
