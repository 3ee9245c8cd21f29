use rusqlite::Connection;

use crate::db as schema;
use crate::error::ApiError;
use crate::identity;
use crate::ipc::error::{failure, ok};
use crate::ipc::helpers::{db, opt_str, require_str, to_json};
use crate::ipc::types::{AppState, Request};
use crate::membership;
use crate::models::Role;
use crate::roster;

/// User plus their memberships, each with the joined class embedded. The
/// shape both `user.me` and `user.updateProfile` hand back.
fn profile_payload(conn: &Connection, user_id: &str) -> Result<serde_json::Value, ApiError> {
    let user = identity::get_user(conn, user_id)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let mut memberships = Vec::new();
    for m in membership::for_user(conn, user_id)? {
        let mut entry = to_json(&m);
        if let Some(class) = roster::get_class(conn, &m.class_id)? {
            entry["class"] = to_json(&class);
        }
        memberships.push(entry);
    }

    let mut payload = to_json(&user);
    payload["memberships"] = serde_json::Value::Array(memberships);
    Ok(payload)
}

fn me(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    let external_id = identity::authenticate(&state.config, req)?;
    let conn = db(state)?;

    // No lazy creation here: a never-seen caller gets NotFound so the client
    // knows to run its registration flow.
    let user = identity::find_user(conn, &external_id)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    profile_payload(conn, &user.id)
}

fn update_profile(state: &AppState, req: &Request) -> Result<serde_json::Value, ApiError> {
    let external_id = identity::authenticate(&state.config, req)?;

    // Validate the join request before any write happens.
    let join = match req.params.get("joinClass") {
        Some(j) if !j.is_null() => {
            let class_id = require_str(j, "classId")?.to_string();
            let role = Role::parse(require_str(j, "role")?)
                .ok_or_else(|| ApiError::bad_params("role must be TEACHER, PARENT or NONE"))?;
            let alias = opt_str(j, "alias").map(str::to_string);
            Some((class_id, role, alias))
        }
        _ => None,
    };

    let conn = db(state)?;
    let user = identity::resolve_user(conn, &external_id)?;
    if let Some((class_id, _, _)) = &join {
        if roster::get_class(conn, class_id)?.is_none() {
            return Err(ApiError::not_found("class not found"));
        }
    }

    let tx = conn.unchecked_transaction()?;
    let now = schema::now();

    if let Some(name) = opt_str(&req.params, "name") {
        tx.execute(
            "UPDATE users SET name = ?, updated_at = ? WHERE id = ?",
            (name, &now, &user.id),
        )?;
    }
    if let Some(avatar_url) = opt_str(&req.params, "avatarUrl") {
        tx.execute(
            "UPDATE users SET avatar_url = ?, updated_at = ? WHERE id = ?",
            (avatar_url, &now, &user.id),
        )?;
    }
    if let Some(current) = opt_str(&req.params, "currentClassId") {
        tx.execute(
            "UPDATE users SET current_class_id = ?, updated_at = ? WHERE id = ?",
            (current, &now, &user.id),
        )?;
    }

    if let Some((class_id, role, alias)) = &join {
        membership::upsert(&tx, &user.id, class_id, *role, alias.as_deref())?;
        // First class joined becomes the current one unless a hint is set.
        tx.execute(
            "UPDATE users SET current_class_id = ?, updated_at = ?
             WHERE id = ? AND current_class_id IS NULL",
            (class_id, &now, &user.id),
        )?;
    }

    tx.commit()?;

    profile_payload(conn, &user.id)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "user.me" => me(state, req),
        "user.updateProfile" => update_profile(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => failure(&req.id, &e),
    })
}
