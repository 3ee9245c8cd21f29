//! The behavior log: scored events against students. Each log row is the
//! sole source of truth for how much one event moved a student's score, so
//! the score bump and the log insert (and their reversal on undo) always
//! commit together.

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::models::{BehaviorLog, ClassDetail};
use crate::roster;

const LOG_COLS: &str =
    "id, student_id, class_id, student_name, behavior_label, value, note, timestamp";

/// Record a scored event: bump the student's running score and append the
/// log row (with a name snapshot) in one transaction. Returns the refreshed
/// class detail the client renders from.
pub fn record_log(
    conn: &Connection,
    class_id: &str,
    student_id: &str,
    behavior_label: &str,
    value: i64,
    note: Option<&str>,
) -> Result<ClassDetail, ApiError> {
    if roster::get_class(conn, class_id)?.is_none() {
        return Err(ApiError::not_found("class not found"));
    }
    let student = roster::get_student_in_class(conn, class_id, student_id)?
        .ok_or_else(|| ApiError::not_found("student not found in this class"))?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE students SET score = score + ? WHERE id = ?",
        (value, student_id),
    )?;
    tx.execute(
        "INSERT INTO behavior_logs(id, student_id, class_id, student_name,
                                   behavior_label, value, note, timestamp)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            Uuid::new_v4().to_string(),
            student_id,
            class_id,
            &student.name,
            behavior_label,
            value,
            note,
            db::now(),
        ),
    )?;
    tx.commit()?;

    roster::class_detail(conn, class_id)
}

/// Undo one log entry: reverse its score contribution and delete the row, in
/// one transaction. When the student row is already gone the reversal is
/// skipped and the log is still removed, so a log can never become
/// unremovable.
pub fn undo_log(conn: &Connection, class_id: &str, log_id: &str) -> Result<ClassDetail, ApiError> {
    let tx = conn.unchecked_transaction()?;

    let sql = format!("SELECT {LOG_COLS} FROM behavior_logs WHERE id = ? AND class_id = ?");
    let log = tx
        .query_row(&sql, [log_id, class_id], BehaviorLog::from_row)
        .optional()?
        .ok_or_else(|| ApiError::not_found("log not found"))?;

    // 0 rows changed means the student was deleted out from under the log.
    tx.execute(
        "UPDATE students SET score = score - ? WHERE id = ?",
        (log.value, &log.student_id),
    )?;
    tx.execute("DELETE FROM behavior_logs WHERE id = ?", [log_id])?;

    tx.commit()?;

    roster::class_detail(conn, class_id)
}
