use crate::backup;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{require_role, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::store::Store;
use serde_json::json;
use std::path::PathBuf;

fn bundle_failed(e: anyhow::Error) -> HandlerErr {
    HandlerErr::new("bundle_failed", format!("{e:#}"))
}

fn backup_export_bundle(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, &[Role::Admin])?;
    let out_path = PathBuf::from(required_str(params, "outPath")?);
    let snapshot = serde_json::to_value(&state.store)
        .map_err(|e| HandlerErr::new("bundle_failed", e.to_string()))?;
    let summary = backup::export_store_bundle(&snapshot, &out_path).map_err(bundle_failed)?;
    tracing::info!(path = %out_path.display(), sha256 = %summary.sha256, "store bundle exported");
    Ok(json!({
        "outPath": out_path.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "sha256": summary.sha256,
    }))
}

fn backup_import_bundle(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_role(state, &[Role::Admin])?;
    let in_path = PathBuf::from(required_str(params, "inPath")?);
    let imported = backup::import_store_bundle(&in_path).map_err(bundle_failed)?;
    let store: Store = serde_json::from_value(imported.snapshot)
        .map_err(|e| HandlerErr::new("bundle_failed", format!("store entry does not match the data model: {e}")))?;

    state.store = store;
    // The session survives only if its user is still present.
    if let Some(id) = state.session.as_deref() {
        if state.store.user(id).is_none() {
            state.session = None;
        }
    }
    tracing::info!(path = %in_path.display(), "store bundle imported");
    Ok(json!({
        "bundleFormatDetected": imported.bundle_format_detected,
        "students": state.store.students().len(),
        "sessionActive": state.session.is_some(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.exportBundle" => backup_export_bundle(state, &req.params),
        "backup.importBundle" => backup_import_bundle(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
