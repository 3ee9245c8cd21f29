//! The membership ledger: the many-to-many relation between users and
//! classes, tagged with a role and an optional display alias.
//!
//! Roles are disjoint tags, not ranks; every privileged operation checks for
//! TEACHER specifically.

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::models::{Class, Membership, Role};

const MEMBERSHIP_COLS: &str = "id, user_id, class_id, role, alias, join_time";

/// Insert or update the single membership row for (user, class).
///
/// Repeat joins update the role in place, keep `join_time` from the first
/// join, and only overwrite the alias when a new one is supplied.
pub fn upsert(
    conn: &Connection,
    user_id: &str,
    class_id: &str,
    role: Role,
    alias: Option<&str>,
) -> Result<Membership, ApiError> {
    conn.execute(
        "INSERT INTO memberships(id, user_id, class_id, role, alias, join_time)
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(user_id, class_id) DO UPDATE SET
           role = excluded.role,
           alias = COALESCE(excluded.alias, memberships.alias)",
        (
            Uuid::new_v4().to_string(),
            user_id,
            class_id,
            role.as_str(),
            alias,
            db::now(),
        ),
    )?;

    membership_of(conn, user_id, class_id)?
        .ok_or_else(|| ApiError::not_found("membership vanished after upsert"))
}

pub fn membership_of(
    conn: &Connection,
    user_id: &str,
    class_id: &str,
) -> Result<Option<Membership>, ApiError> {
    let sql =
        format!("SELECT {MEMBERSHIP_COLS} FROM memberships WHERE user_id = ? AND class_id = ?");
    Ok(conn
        .query_row(&sql, [user_id, class_id], Membership::from_row)
        .optional()?)
}

/// Guard for privileged operations. Absent membership and a non-TEACHER role
/// both read as the same denial.
pub fn require_teacher(
    conn: &Connection,
    user_id: &str,
    class_id: &str,
    action: &str,
) -> Result<Membership, ApiError> {
    let sql = format!(
        "SELECT {MEMBERSHIP_COLS} FROM memberships
         WHERE user_id = ? AND class_id = ? AND role = 'TEACHER'"
    );
    conn.query_row(&sql, [user_id, class_id], Membership::from_row)
        .optional()?
        .ok_or_else(|| ApiError::PermissionDenied(format!("only a teacher can {action}")))
}

pub fn remove(conn: &Connection, user_id: &str, class_id: &str) -> Result<(), ApiError> {
    let changed = conn.execute(
        "DELETE FROM memberships WHERE user_id = ? AND class_id = ?",
        [user_id, class_id],
    )?;
    if changed == 0 {
        return Err(ApiError::not_found("membership not found"));
    }
    Ok(())
}

pub fn for_user(conn: &Connection, user_id: &str) -> Result<Vec<Membership>, ApiError> {
    let sql = format!(
        "SELECT {MEMBERSHIP_COLS} FROM memberships WHERE user_id = ? ORDER BY join_time, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], Membership::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Classes the user belongs to, in join order.
pub fn classes_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Class>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.teacher_name, c.owner_id, c.created_at, c.updated_at
         FROM classes c
         JOIN memberships m ON m.class_id = c.id
         WHERE m.user_id = ?
         ORDER BY m.join_time, m.id",
    )?;
    let rows = stmt
        .query_map([user_id], Class::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
