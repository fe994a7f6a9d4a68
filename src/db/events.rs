//! Calendar event store. Same document shape as groups: the attendee list is
//! a JSON column rewritten whole under an IMMEDIATE transaction.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Event, EventLocation};
use crate::error::AppError;

const COLUMNS: &str = "id, title, description, date, hall_name, house_no, road_no, \
                       area_name, thana, district, created_by, attendees, created_at";

#[allow(clippy::type_complexity)]
type EventRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
);

pub fn insert(conn: &Connection, event: &Event) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO events
         (id, title, description, date, hall_name, house_no, road_no,
          area_name, thana, district, created_by, attendees, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            event.id,
            event.title,
            event.description,
            event.date,
            event.location.hall_name,
            event.location.house_no,
            event.location.road_no,
            event.location.area_name,
            event.location.thana,
            event.location.district,
            event.created_by,
            serde_json::to_string(&event.attendees)?,
            event.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Event>, AppError> {
    let row: Option<EventRow> = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM events WHERE id = ?1"),
            params![id],
            read_row,
        )
        .optional()?;
    row.map(into_event).transpose()
}

/// Events the user attends, soonest first.
pub fn attended_by(conn: &Connection, user_id: &str) -> Result<Vec<Event>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM events ORDER BY date ASC, id ASC"
    ))?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    let events = rows
        .into_iter()
        .map(into_event)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events
        .into_iter()
        .filter(|e| e.attendees.iter().any(|a| a == user_id))
        .collect())
}

pub fn update_attendees(conn: &Connection, event: &Event) -> Result<(), AppError> {
    conn.execute(
        "UPDATE events SET attendees = ?1 WHERE id = ?2",
        params![serde_json::to_string(&event.attendees)?, event.id],
    )?;
    Ok(())
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<EventRow> {
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
        row.get(11)?,
        row.get(12)?,
    ))
}

fn into_event(
    (
        id,
        title,
        description,
        date,
        hall_name,
        house_no,
        road_no,
        area_name,
        thana,
        district,
        created_by,
        attendees,
        created_at,
    ): EventRow,
) -> Result<Event, AppError> {
    Ok(Event {
        id,
        title,
        description,
        date,
        location: EventLocation {
            hall_name,
            house_no,
            road_no,
            area_name,
            thana,
            district,
        },
        created_by,
        attendees: serde_json::from_str(&attendees)?,
        created_at,
    })
}
