use crate::behavior;
use crate::error::ApiError;
use crate::identity;
use crate::ipc::error::{failure, ok};
use crate::ipc::helpers::{db, opt_str, require_i64, require_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::membership;

fn record(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    identity::authenticate(&state.config, req)?;
    let class_id = require_str(&req.params, "classId")?;
    let student_id = require_str(&req.params, "studentId")?;
    let behavior_label = require_str(&req.params, "behaviorLabel")?;
    let value = require_i64(&req.params, "value")?;
    let note = opt_str(&req.params, "note");
    let conn = db(state)?;

    let detail = behavior::record_log(conn, class_id, student_id, behavior_label, value, note)?;
    Ok(to_json(&detail))
}

fn undo(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    let external_id = identity::authenticate(&state.config, req)?;
    let class_id = require_str(&req.params, "classId")?;
    let log_id = require_str(&req.params, "logId")?;
    let conn = db(state)?;

    let user = identity::find_user(conn, &external_id)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    membership::require_teacher(conn, &user.id, class_id, "undo logs")?;

    let detail = behavior::undo_log(conn, class_id, log_id)?;
    tracing::info!(class_id, log_id, "log undone");
    Ok(to_json(&detail))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "logs.record" => record(state, req),
        "logs.undo" => undo(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => failure(&req.id, &e),
    })
}
