use crate::calc;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{optional_str, parse_role, require_role, required_str, session_user};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::store::NewNotification;
use chrono::Utc;
use serde_json::json;

fn notifications_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = session_user(state)?;
    let role = match optional_str(params, "role")? {
        None => user.role,
        Some(raw) => parse_role(&raw)?,
    };
    // Only admins may look at another role's feed.
    if role != user.role && user.role != Role::Admin {
        return Err(HandlerErr::new(
            "forbidden",
            format!("{} role may only list its own notifications", user.role.as_str()),
        ));
    }

    let feed = calc::notifications_for_role(state.store.notifications(), role);
    Ok(json!({
        "role": role,
        "unreadCount": calc::unread_count(feed.iter().copied()),
        "notifications": feed,
    }))
}

fn parse_target_roles(params: &serde_json::Value) -> Result<Vec<Role>, HandlerErr> {
    let Some(raw) = params.get("targetRoles").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("targetRoles must be an array"));
    };
    let mut roles: Vec<Role> = Vec::new();
    for v in raw {
        let Some(s) = v.as_str() else {
            return Err(HandlerErr::bad_params("targetRoles entries must be strings"));
        };
        let role = parse_role(s)?;
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    if roles.is_empty() {
        return Err(HandlerErr::bad_params(
            "select at least one recipient group",
        ));
    }
    Ok(roles)
}

fn notifications_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = require_role(state, &[Role::Admin])?;
    let new = NewNotification {
        title: required_str(params, "title")?,
        message: required_str(params, "message")?,
        target_roles: parse_target_roles(params)?,
    };
    let targets = new
        .target_roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",");
    tracing::info!(created_by = %user.id, targets = %targets, "notification sent");

    let (next, notification_id) = state.store.create_notification(new, &user.id, Utc::now());
    state.store = next;
    Ok(json!({ "notificationId": notification_id }))
}

fn notifications_mark_read(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = session_user(state)?;
    let notification_id = required_str(params, "notificationId")?;
    let Some(notification) = state
        .store
        .notifications()
        .iter()
        .find(|n| n.id == notification_id)
    else {
        return Err(HandlerErr::new("not_found", "notification not found"));
    };
    // Same visibility as notifications.list.
    if user.role != Role::Admin && !notification.targets(user.role) {
        return Err(HandlerErr::new(
            "forbidden",
            "notification is not in this role's feed",
        ));
    }
    state.store = state.store.mark_notification_read(&notification_id)?;
    Ok(json!({ "notificationId": notification_id, "read": true }))
}

fn notifications_mark_all_read(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let user = session_user(state)?;
    let (next, updated) = state.store.mark_all_read(user.role);
    state.store = next;
    tracing::debug!(role = user.role.as_str(), updated, "notifications marked read");
    Ok(json!({ "updated": updated }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "notifications.list" => notifications_list(state, &req.params),
        "notifications.create" => notifications_create(state, &req.params),
        "notifications.markRead" => notifications_mark_read(state, &req.params),
        "notifications.markAllRead" => notifications_mark_all_read(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
