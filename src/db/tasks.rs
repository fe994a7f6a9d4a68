//! Group task store. Tasks are plain rows, not documents; status is the only
//! mutable field.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Task, TaskStatus};
use crate::error::AppError;

const COLUMNS: &str = "id, group_id, title, description, assigned_to, status, due_date, created_at";

pub fn insert(conn: &Connection, task: &Task) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO tasks (id, group_id, title, description, assigned_to, status, due_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            task.id,
            task.group_id,
            task.title,
            task.description,
            task.assigned_to,
            task.status.as_str(),
            task.due_date,
            task.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Task>, AppError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        read_row,
    )
    .optional()
    .map_err(AppError::from)
}

pub fn list_for_group(conn: &Connection, group_id: &str) -> Result<Vec<Task>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM tasks WHERE group_id = ?1 ORDER BY created_at ASC, id ASC"
    ))?;
    let tasks = stmt
        .query_map(params![group_id], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn update_status(conn: &Connection, id: &str, status: TaskStatus) -> Result<(), AppError> {
    conn.execute(
        "UPDATE tasks SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(())
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let status: String = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        group_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        assigned_to: row.get(4)?,
        // Unknown values cannot appear: writes go through TaskStatus::as_str
        status: TaskStatus::parse(&status).unwrap_or(TaskStatus::Pending),
        due_date: row.get(6)?,
        created_at: row.get(7)?,
    })
}
