use serde_json::json;

use crate::error::ApiError;
use crate::identity;
use crate::ipc::error::{failure, ok};
use crate::ipc::helpers::{db, require_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::membership;
use crate::models::Role;
use crate::roster;

fn create(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    let external_id = identity::authenticate(&state.config, req)?;
    let name = require_str(&req.params, "name")?;
    let teacher_name = require_str(&req.params, "teacherName")?;
    let conn = db(state)?;

    let owner = identity::resolve_user(conn, &external_id)?;
    let class = roster::create_class(conn, name, teacher_name, &owner)?;
    Ok(to_json(&class))
}

fn list_mine(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    let external_id = identity::authenticate(&state.config, req)?;
    let conn = db(state)?;

    // A caller the daemon has never seen simply has no classes yet.
    let Some(user) = identity::find_user(conn, &external_id)? else {
        return Ok(json!({ "classes": [] }));
    };
    let classes = membership::classes_for_user(conn, &user.id)?;
    Ok(json!({ "classes": to_json(&classes) }))
}

fn detail(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    identity::authenticate(&state.config, req)?;
    let class_id = require_str(&req.params, "classId")?;
    let conn = db(state)?;

    let detail = roster::class_detail(conn, class_id)?;
    Ok(to_json(&detail))
}

/// Teachers dissolve the class (full cascade); everyone else just leaves.
fn dissolve_or_leave(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    let external_id = identity::authenticate(&state.config, req)?;
    let class_id = require_str(&req.params, "classId")?;
    let conn = db(state)?;

    let user = identity::find_user(conn, &external_id)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let m = membership::membership_of(conn, &user.id, class_id)?
        .ok_or_else(|| ApiError::not_found("you are not a member of this class"))?;

    if m.role == Role::Teacher {
        roster::dissolve_class(conn, class_id)?;
        tracing::info!(class_id, user_id = %user.id, "class dissolved");
        Ok(json!({ "dissolved": true }))
    } else {
        roster::leave_class(conn, &user.id, class_id)?;
        tracing::info!(class_id, user_id = %user.id, "left class");
        Ok(json!({ "left": true }))
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "classes.create" => create(state, req),
        "classes.listMine" => list_mine(state, req),
        "classes.detail" => detail(state, req),
        "classes.dissolveOrLeave" => dissolve_or_leave(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => failure(&req.id, &e),
    })
}
