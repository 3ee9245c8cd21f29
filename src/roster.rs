//! Class and student storage, plus the multi-row mutations that must apply
//! all-or-nothing: class creation, student deletion, class dissolution and
//! leaving a class.
//!
//! Cascades are explicit and child-first (logs before students and
//! memberships, those before the class row); foreign keys only backstop the
//! ordering.

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::membership;
use crate::models::{BehaviorLog, Class, ClassDetail, Role, Student, User};

const CLASS_COLS: &str = "id, name, teacher_name, owner_id, created_at, updated_at";
const STUDENT_COLS: &str = "id, class_id, name, score, avatar_seed";
const LOG_COLS: &str =
    "id, student_id, class_id, student_name, behavior_label, value, note, timestamp";

/// Create a class and, in the same transaction, record the owner's TEACHER
/// membership and point the owner's current-class hint at it when unset. A
/// class is never visible without its owner's membership.
pub fn create_class(
    conn: &Connection,
    name: &str,
    teacher_name: &str,
    owner: &User,
) -> Result<Class, ApiError> {
    let tx = conn.unchecked_transaction()?;

    let class_id = Uuid::new_v4().to_string();
    let now = db::now();
    tx.execute(
        "INSERT INTO classes(id, name, teacher_name, owner_id, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (&class_id, name, teacher_name, &owner.id, &now, &now),
    )?;

    membership::upsert(&tx, &owner.id, &class_id, Role::Teacher, None)?;

    if owner.current_class_id.is_none() {
        tx.execute(
            "UPDATE users SET current_class_id = ?, updated_at = ? WHERE id = ?",
            (&class_id, &now, &owner.id),
        )?;
    }

    tx.commit()?;

    Ok(Class {
        id: class_id,
        name: name.to_string(),
        teacher_name: teacher_name.to_string(),
        owner_id: owner.id.clone(),
        created_at: now.clone(),
        updated_at: now,
    })
}

pub fn get_class(conn: &Connection, class_id: &str) -> Result<Option<Class>, ApiError> {
    let sql = format!("SELECT {CLASS_COLS} FROM classes WHERE id = ?");
    Ok(conn.query_row(&sql, [class_id], Class::from_row).optional()?)
}

pub fn add_student(conn: &Connection, class_id: &str, name: &str) -> Result<Student, ApiError> {
    if get_class(conn, class_id)?.is_none() {
        return Err(ApiError::not_found("class not found"));
    }

    let student = Student {
        id: Uuid::new_v4().to_string(),
        class_id: class_id.to_string(),
        name: name.to_string(),
        score: 0,
        avatar_seed: Uuid::new_v4().simple().to_string(),
    };
    conn.execute(
        "INSERT INTO students(id, class_id, name, score, avatar_seed)
         VALUES(?, ?, ?, ?, ?)",
        (
            &student.id,
            &student.class_id,
            &student.name,
            student.score,
            &student.avatar_seed,
        ),
    )?;
    Ok(student)
}

pub fn get_student_in_class(
    conn: &Connection,
    class_id: &str,
    student_id: &str,
) -> Result<Option<Student>, ApiError> {
    let sql = format!("SELECT {STUDENT_COLS} FROM students WHERE id = ? AND class_id = ?");
    Ok(conn
        .query_row(&sql, [student_id, class_id], Student::from_row)
        .optional()?)
}

/// Delete a student and every behavior log that references them, atomically.
/// Caller-side permission checks happen before this runs.
pub fn delete_student(
    conn: &Connection,
    class_id: &str,
    student_id: &str,
) -> Result<(), ApiError> {
    if get_student_in_class(conn, class_id, student_id)?.is_none() {
        return Err(ApiError::not_found("student not found in this class"));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM behavior_logs WHERE student_id = ? AND class_id = ?",
        [student_id, class_id],
    )?;
    tx.execute(
        "DELETE FROM students WHERE id = ? AND class_id = ?",
        [student_id, class_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Class plus its students and logs, logs newest-first. Insertion order
/// breaks timestamp ties so same-instant logs still read newest-first.
pub fn class_detail(conn: &Connection, class_id: &str) -> Result<ClassDetail, ApiError> {
    let class =
        get_class(conn, class_id)?.ok_or_else(|| ApiError::not_found("class not found"))?;

    let sql = format!("SELECT {STUDENT_COLS} FROM students WHERE class_id = ? ORDER BY rowid");
    let mut stmt = conn.prepare(&sql)?;
    let students = stmt
        .query_map([class_id], Student::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let sql = format!(
        "SELECT {LOG_COLS} FROM behavior_logs
         WHERE class_id = ?
         ORDER BY timestamp DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let logs = stmt
        .query_map([class_id], BehaviorLog::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassDetail {
        class,
        students,
        logs,
    })
}

/// Dissolve a class: delete its logs, students and memberships, then the
/// class row, then clear every user's current-class hint that pointed at it.
/// One transaction; a failure at any step leaves nothing deleted.
pub fn dissolve_class(conn: &Connection, class_id: &str) -> Result<(), ApiError> {
    let tx = conn.unchecked_transaction()?;

    tx.execute("DELETE FROM behavior_logs WHERE class_id = ?", [class_id])?;
    tx.execute("DELETE FROM students WHERE class_id = ?", [class_id])?;
    tx.execute("DELETE FROM memberships WHERE class_id = ?", [class_id])?;
    tx.execute("DELETE FROM classes WHERE id = ?", [class_id])?;
    tx.execute(
        "UPDATE users SET current_class_id = NULL, updated_at = ? WHERE current_class_id = ?",
        (db::now(), class_id),
    )?;

    tx.commit()?;
    Ok(())
}

/// Leave a class: drop the caller's membership and clear their current-class
/// hint if it pointed at the class. No cascade.
pub fn leave_class(conn: &Connection, user_id: &str, class_id: &str) -> Result<(), ApiError> {
    let tx = conn.unchecked_transaction()?;

    membership::remove(&tx, user_id, class_id)?;
    tx.execute(
        "UPDATE users SET current_class_id = NULL, updated_at = ?
         WHERE id = ? AND current_class_id = ?",
        (db::now(), user_id, class_id),
    )?;

    tx.commit()?;
    Ok(())
}
