//! Thread document store.
//!
//! A thread row is one document: vote sets and the embedded comment list are
//! JSON columns, the optional attachment lives in blob columns beside them.
//! Votes and comments rewrite the document columns in one statement so no
//! partial state is ever visible to readers.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{FileMeta, Thread, ThreadFile};
use crate::error::AppError;

const COLUMNS: &str = "id, title, content, author_id, group_id, \
                       file_name, file_content_type, upvotes, downvotes, comments, created_at";

#[allow(clippy::type_complexity)]
type ThreadRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
    String,
);

pub fn insert(conn: &Connection, thread: &Thread, file: Option<&ThreadFile>) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO threads
         (id, title, content, author_id, group_id,
          file_name, file_content_type, file_data,
          upvotes, downvotes, comments, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            thread.id,
            thread.title,
            thread.content,
            thread.author_id,
            thread.group_id,
            file.map(|f| f.name.as_str()),
            file.map(|f| f.content_type.as_str()),
            file.map(|f| f.data.as_slice()),
            serde_json::to_string(&thread.upvotes)?,
            serde_json::to_string(&thread.downvotes)?,
            serde_json::to_string(&thread.comments)?,
            thread.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Thread>, AppError> {
    let row: Option<ThreadRow> = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM threads WHERE id = ?1"),
            params![id],
            read_row,
        )
        .optional()?;
    row.map(into_thread).transpose()
}

/// All threads, newest first. Uuid v7 ids break created-at ties in creation
/// order.
pub fn list_all(conn: &Connection) -> Result<Vec<Thread>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM threads ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_thread).collect()
}

pub fn list_by_author(conn: &Connection, author_id: &str) -> Result<Vec<Thread>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM threads WHERE author_id = ?1 ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt
        .query_map(params![author_id], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_thread).collect()
}

/// Rewrite the mutable document state (vote sets and comments) of a thread.
/// Title, content, author and attachment are immutable after creation.
pub fn save_document(conn: &Connection, thread: &Thread) -> Result<(), AppError> {
    conn.execute(
        "UPDATE threads SET upvotes = ?1, downvotes = ?2, comments = ?3 WHERE id = ?4",
        params![
            serde_json::to_string(&thread.upvotes)?,
            serde_json::to_string(&thread.downvotes)?,
            serde_json::to_string(&thread.comments)?,
            thread.id,
        ],
    )?;
    Ok(())
}

/// The attachment of a thread, or None when the thread is missing or has no
/// file. Callers cannot distinguish the two cases; both are "File not found".
pub fn get_file(conn: &Connection, id: &str) -> Result<Option<ThreadFile>, AppError> {
    let row: Option<(Option<String>, Option<String>, Option<Vec<u8>>)> = conn
        .query_row(
            "SELECT file_name, file_content_type, file_data FROM threads WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    Ok(match row {
        Some((Some(name), Some(content_type), Some(data))) => Some(ThreadFile {
            name,
            content_type,
            data,
        }),
        _ => None,
    })
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<ThreadRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn into_thread(
    (
        id,
        title,
        content,
        author_id,
        group_id,
        file_name,
        file_content_type,
        upvotes,
        downvotes,
        comments,
        created_at,
    ): ThreadRow,
) -> Result<Thread, AppError> {
    let file = match (file_name, file_content_type) {
        (Some(name), Some(content_type)) => Some(FileMeta { name, content_type }),
        _ => None,
    };
    Ok(Thread {
        id,
        title,
        content,
        author_id,
        group_id,
        file,
        upvotes: serde_json::from_str(&upvotes)?,
        downvotes: serde_json::from_str(&downvotes)?,
        comments: serde_json::from_str(&comments)?,
        created_at,
    })
}
