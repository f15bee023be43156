use crate::calc;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{optional_str, require_role, result_json, student_row_json};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

fn children_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let user = require_role(state, &[Role::Parent, Role::Admin])?;
    let parent_id = match (user.role, optional_str(params, "parentId")?) {
        (Role::Admin, Some(id)) => id,
        (Role::Admin, None) => {
            return Err(HandlerErr::bad_params("missing parentId"));
        }
        (_, Some(id)) if id != user.id => {
            return Err(HandlerErr::new(
                "forbidden",
                "parents may only view their own children",
            ));
        }
        _ => user.id.clone(),
    };

    let store = &state.store;
    let children: Vec<serde_json::Value> = calc::children_of(store.users(), store.students(), &parent_id)
        .into_iter()
        .map(|child| {
            let results: Vec<serde_json::Value> = store
                .exam_results()
                .iter()
                .filter(|r| r.student_id == child.id)
                .map(|r| result_json(store, r))
                .collect();
            let mut row = student_row_json(store, child);
            row["results"] = json!(results);
            row
        })
        .collect();

    Ok(json!({ "parentId": parent_id, "children": children }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "children.list" => children_list(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
