//! Row types and their wire (JSON) shapes.
//!
//! Field names follow the original client API: camelCase, optional fields
//! omitted when NULL.

use rusqlite::Row;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    #[serde(rename = "TEACHER")]
    Teacher,
    #[serde(rename = "PARENT")]
    Parent,
    #[serde(rename = "NONE")]
    None,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "TEACHER",
            Role::Parent => "PARENT",
            Role::None => "NONE",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "TEACHER" => Some(Role::Teacher),
            "PARENT" => Some(Role::Parent),
            "NONE" => Some(Role::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_class_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn from_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            external_id: row.get(1)?,
            name: row.get(2)?,
            avatar_url: row.get(3)?,
            current_class_id: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    pub teacher_name: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Class {
    pub fn from_row(row: &Row) -> rusqlite::Result<Class> {
        Ok(Class {
            id: row.get(0)?,
            name: row.get(1)?,
            teacher_name: row.get(2)?,
            owner_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub class_id: String,
    pub name: String,
    pub score: i64,
    pub avatar_seed: String,
}

impl Student {
    pub fn from_row(row: &Row) -> rusqlite::Result<Student> {
        Ok(Student {
            id: row.get(0)?,
            class_id: row.get(1)?,
            name: row.get(2)?,
            score: row.get(3)?,
            avatar_seed: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorLog {
    pub id: String,
    pub student_id: String,
    pub class_id: String,
    /// Snapshot of the student's name at creation time; survives later
    /// renames and deletion of the student row.
    pub student_name: String,
    pub behavior_label: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: String,
}

impl BehaviorLog {
    pub fn from_row(row: &Row) -> rusqlite::Result<BehaviorLog> {
        Ok(BehaviorLog {
            id: row.get(0)?,
            student_id: row.get(1)?,
            class_id: row.get(2)?,
            student_name: row.get(3)?,
            behavior_label: row.get(4)?,
            value: row.get(5)?,
            note: row.get(6)?,
            timestamp: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub class_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub join_time: String,
}

impl Membership {
    pub fn from_row(row: &Row) -> rusqlite::Result<Membership> {
        let role_str: String = row.get(3)?;
        Ok(Membership {
            id: row.get(0)?,
            user_id: row.get(1)?,
            class_id: row.get(2)?,
            role: Role::parse(&role_str).unwrap_or(Role::None),
            alias: row.get(4)?,
            join_time: row.get(5)?,
        })
    }
}

/// A class plus its students and behavior logs, logs newest-first. The
/// payload every log mutation hands back so the client can refresh in place.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDetail {
    #[serde(flatten)]
    pub class: Class,
    pub students: Vec<Student>,
    pub logs: Vec<BehaviorLog>,
}
