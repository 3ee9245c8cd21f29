use serde_json::json;

use crate::error::ApiError;
use crate::identity;
use crate::ipc::error::{failure, ok};
use crate::ipc::helpers::{db, require_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::membership;
use crate::roster;

fn create(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    identity::authenticate(&state.config, req)?;
    let class_id = require_str(&req.params, "classId")?;
    let name = require_str(&req.params, "name")?;
    let conn = db(state)?;

    let student = roster::add_student(conn, class_id, name)?;
    Ok(to_json(&student))
}

fn delete(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    let external_id = identity::authenticate(&state.config, req)?;
    let class_id = require_str(&req.params, "classId")?;
    let student_id = require_str(&req.params, "studentId")?;
    let conn = db(state)?;

    let user = identity::find_user(conn, &external_id)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    membership::require_teacher(conn, &user.id, class_id, "delete students")?;

    roster::delete_student(conn, class_id, student_id)?;
    tracing::info!(class_id, student_id, "student deleted");
    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.create" => create(state, req),
        "students.delete" => delete(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => failure(&req.id, &e),
    })
}
