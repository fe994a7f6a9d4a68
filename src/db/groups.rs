//! Group document store. The member list is a JSON column read and rewritten
//! whole; callers wrap read-modify-write spans in an IMMEDIATE transaction.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Group;
use crate::error::AppError;

const COLUMNS: &str = "id, name, description, created_by, members, created_at";

type GroupRow = (String, String, String, String, String, String);

pub fn insert(conn: &Connection, group: &Group) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO groups (id, name, description, created_by, members, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            group.id,
            group.name,
            group.description,
            group.created_by,
            serde_json::to_string(&group.members)?,
            group.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Group>, AppError> {
    let row: Option<GroupRow> = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM groups WHERE id = ?1"),
            params![id],
            read_row,
        )
        .optional()?;
    row.map(into_group).transpose()
}

pub fn list(conn: &Connection) -> Result<Vec<Group>, AppError> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM groups"))?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_group).collect()
}

/// Groups whose member list contains the given user.
pub fn joined_by(conn: &Connection, user_id: &str) -> Result<Vec<Group>, AppError> {
    let groups = list(conn)?;
    Ok(groups
        .into_iter()
        .filter(|g| g.members.iter().any(|m| m == user_id))
        .collect())
}

/// Rewrite the member list of an existing group.
pub fn update_members(conn: &Connection, group: &Group) -> Result<(), AppError> {
    conn.execute(
        "UPDATE groups SET members = ?1 WHERE id = ?2",
        params![serde_json::to_string(&group.members)?, group.id],
    )?;
    Ok(())
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<GroupRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_group(
    (id, name, description, created_by, members, created_at): GroupRow,
) -> Result<Group, AppError> {
    Ok(Group {
        id,
        name,
        description,
        created_by,
        members: serde_json::from_str(&members)?,
        created_at,
    })
}
