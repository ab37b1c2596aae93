use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::ScheduleEvent;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Insert a batch of events atomically.
///
/// Either every event lands or none do; a constraint failure on any row
/// rolls the whole batch back so a partially extracted document never
/// leaves stray rows behind.
pub fn insert_events_batch(
    conn: &Connection,
    events: &[ScheduleEvent],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    insert_events(&tx, events)?;
    tx.commit()?;
    Ok(())
}

/// Insert events without opening a transaction. Callers that need the
/// batch tied to other writes wrap this in their own transaction.
pub fn insert_events(conn: &Connection, events: &[ScheduleEvent]) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO events (id, document_id, event_date, start_time, end_time,
         description, source_pdf, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for event in events {
        stmt.execute(params![
            event.id.to_string(),
            event.document_id.map(|id| id.to_string()),
            event.event_date.format(DATE_FORMAT).to_string(),
            event.start_time.format(TIME_FORMAT).to_string(),
            event.end_time.map(|t| t.format(TIME_FORMAT).to_string()),
            event.description,
            event.source_pdf,
            event.created_at.format(DATETIME_FORMAT).to_string(),
        ])?;
    }
    Ok(())
}

/// Events for one source document, chronological.
pub fn get_events_by_source(
    conn: &Connection,
    source_pdf: &str,
) -> Result<Vec<ScheduleEvent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_id, event_date, start_time, end_time, description,
         source_pdf, created_at
         FROM events WHERE source_pdf = ?1 ORDER BY event_date ASC, start_time ASC",
    )?;

    let rows = stmt.query_map(params![source_pdf], map_event_row)?;

    let mut events = Vec::new();
    for row in rows {
        events.push(event_from_row(row?)?);
    }
    Ok(events)
}

pub fn count_events_by_source(conn: &Connection, source_pdf: &str) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM events WHERE source_pdf = ?1",
        params![source_pdf],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(count)
}

pub fn delete_event(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let rows = conn.execute("DELETE FROM events WHERE id = ?1", params![id.to_string()])?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Event".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for ScheduleEvent mapping
struct EventRow {
    id: String,
    document_id: Option<String>,
    event_date: String,
    start_time: String,
    end_time: Option<String>,
    description: String,
    source_pdf: String,
    created_at: String,
}

fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get::<_, String>(0)?,
        document_id: row.get::<_, Option<String>>(1)?,
        event_date: row.get::<_, String>(2)?,
        start_time: row.get::<_, String>(3)?,
        end_time: row.get::<_, Option<String>>(4)?,
        description: row.get::<_, String>(5)?,
        source_pdf: row.get::<_, String>(6)?,
        created_at: row.get::<_, String>(7)?,
    })
}

fn event_from_row(row: EventRow) -> Result<ScheduleEvent, DatabaseError> {
    let parse_time = |s: &str| {
        NaiveTime::parse_from_str(s, TIME_FORMAT)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
    };

    Ok(ScheduleEvent {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        document_id: row.document_id.and_then(|s| Uuid::parse_str(&s).ok()),
        event_date: NaiveDate::parse_from_str(&row.event_date, DATE_FORMAT)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        start_time: parse_time(&row.start_time)?,
        end_time: row.end_time.as_deref().map(parse_time).transpose()?,
        description: row.description,
        source_pdf: row.source_pdf,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, DATETIME_FORMAT)
            .unwrap_or_default(),
    })
}
