//! Caller identity resolution.
//!
//! The host shim authenticates the real client and forwards an opaque
//! external identity on every request. This module only decides whether a
//! request carries one and lazily materializes the matching user row.

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::error::ApiError;
use crate::ipc::Request;
use crate::models::User;

const USER_COLS: &str = "id, external_id, name, avatar_url, current_class_id, created_at, updated_at";

/// Extract the caller's external identity from the request envelope.
/// `debugCaller` is a development-only escape hatch.
pub fn authenticate(config: &Config, req: &Request) -> Result<String, ApiError> {
    if let Some(caller) = req.caller.as_deref().filter(|c| !c.is_empty()) {
        return Ok(caller.to_string());
    }
    if config.debug_identity_allowed() {
        if let Some(caller) = req.debug_caller.as_deref().filter(|c| !c.is_empty()) {
            return Ok(caller.to_string());
        }
    }
    Err(ApiError::Unauthorized)
}

pub fn find_user(conn: &Connection, external_id: &str) -> Result<Option<User>, ApiError> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE external_id = ?");
    Ok(conn
        .query_row(&sql, [external_id], User::from_row)
        .optional()?)
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<User>, ApiError> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE id = ?");
    Ok(conn.query_row(&sql, [user_id], User::from_row).optional()?)
}

/// Find the user for an external identity, creating the row on first
/// contact. Idempotent per identity: the unique constraint makes a racing
/// duplicate insert a no-op and the re-select returns the winner.
pub fn resolve_user(conn: &Connection, external_id: &str) -> Result<User, ApiError> {
    if let Some(user) = find_user(conn, external_id)? {
        return Ok(user);
    }

    let now = db::now();
    conn.execute(
        "INSERT INTO users(id, external_id, created_at, updated_at)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(external_id) DO NOTHING",
        (Uuid::new_v4().to_string(), external_id, &now, &now),
    )?;

    find_user(conn, external_id)?
        .ok_or_else(|| ApiError::not_found("user vanished after creation"))
}
