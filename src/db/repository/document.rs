use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Document, DocumentStatus};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, filename, file_path, status, events_count, error_message,
         confidence_score, processing_time_seconds, created_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            doc.id.to_string(),
            doc.filename,
            doc.file_path,
            doc.status.as_str(),
            doc.events_count,
            doc.error_message,
            doc.confidence_score,
            doc.processing_time_seconds,
            doc.created_at.format(DATETIME_FORMAT).to_string(),
            doc.completed_at.map(|t| t.format(DATETIME_FORMAT).to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, file_path, status, events_count, error_message,
         confidence_score, processing_time_seconds, created_at, completed_at
         FROM documents WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], map_document_row);

    match result {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All documents, newest upload first.
pub fn list_documents(conn: &Connection) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, file_path, status, events_count, error_message,
         confidence_score, processing_time_seconds, created_at, completed_at
         FROM documents ORDER BY created_at DESC, id",
    )?;

    let rows = stmt.query_map([], map_document_row)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

/// Transition a processing document to `completed`.
///
/// The WHERE clause guards the terminal invariant: a document that already
/// reached `completed` or `failed` is never rewritten.
pub fn mark_completed(
    conn: &Connection,
    document_id: &Uuid,
    events_count: u32,
    confidence_score: f32,
    processing_time_seconds: f32,
) -> Result<(), DatabaseError> {
    let now = chrono::Utc::now().naive_utc().format(DATETIME_FORMAT).to_string();
    let rows = conn.execute(
        "UPDATE documents SET status = 'completed', events_count = ?2, error_message = NULL,
         confidence_score = ?3, processing_time_seconds = ?4, completed_at = ?5
         WHERE id = ?1 AND status = 'processing'",
        params![
            document_id.to_string(),
            events_count,
            confidence_score,
            processing_time_seconds,
            now,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "document {document_id} is not in processing state"
        )));
    }
    Ok(())
}

/// Transition a processing document to `failed` with a human-readable message.
pub fn mark_failed(
    conn: &Connection,
    document_id: &Uuid,
    error_message: &str,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE documents SET status = 'failed', error_message = ?2
         WHERE id = ?1 AND status = 'processing'",
        params![document_id.to_string(), error_message],
    )?;
    if rows == 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "document {document_id} is not in processing state"
        )));
    }
    Ok(())
}

/// Fail documents stuck in `processing` longer than `max_age_seconds`.
///
/// Covers runs that died without reaching a terminal transition (process
/// crash, kill during an upstream call). Returns the ids that were failed.
pub fn fail_stale_processing(
    conn: &Connection,
    max_age_seconds: i64,
) -> Result<Vec<Uuid>, DatabaseError> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::seconds(max_age_seconds))
        .naive_utc()
        .format(DATETIME_FORMAT)
        .to_string();

    let mut stmt = conn.prepare(
        "SELECT id FROM documents WHERE status = 'processing' AND created_at < ?1",
    )?;
    let stale: Vec<Uuid> = stmt
        .query_map(params![cutoff], |row| row.get::<_, String>(0))?
        .filter_map(|r| r.ok())
        .filter_map(|s| Uuid::parse_str(&s).ok())
        .collect();
    drop(stmt);

    for id in &stale {
        mark_failed(conn, id, "Processing timed out")?;
    }
    Ok(stale)
}

// Internal row type for Document mapping
struct DocumentRow {
    id: String,
    filename: String,
    file_path: String,
    status: String,
    events_count: u32,
    error_message: Option<String>,
    confidence_score: Option<f32>,
    processing_time_seconds: Option<f32>,
    created_at: String,
    completed_at: Option<String>,
}

fn map_document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get::<_, String>(0)?,
        filename: row.get::<_, String>(1)?,
        file_path: row.get::<_, String>(2)?,
        status: row.get::<_, String>(3)?,
        events_count: row.get::<_, u32>(4)?,
        error_message: row.get::<_, Option<String>>(5)?,
        confidence_score: row.get::<_, Option<f32>>(6)?,
        processing_time_seconds: row.get::<_, Option<f32>>(7)?,
        created_at: row.get::<_, String>(8)?,
        completed_at: row.get::<_, Option<String>>(9)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        filename: row.filename,
        file_path: row.file_path,
        status: DocumentStatus::from_str(&row.status)?,
        events_count: row.events_count,
        error_message: row.error_message,
        confidence_score: row.confidence_score,
        processing_time_seconds: row.processing_time_seconds,
        created_at: parse_datetime(&row.created_at),
        completed_at: row.completed_at.as_deref().map(parse_datetime),
    })
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn insert_and_fetch_document() {
        let conn = open_memory_database().unwrap();
        let doc = Document::new_processing("sof.pdf", "uploads/sof.pdf");
        insert_document(&conn, &doc).unwrap();

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(fetched.filename, "sof.pdf");
        assert_eq!(fetched.status, DocumentStatus::Processing);
        assert_eq!(fetched.events_count, 0);
    }

    #[test]
    fn missing_document_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_document(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn list_orders_newest_first() {
        let conn = open_memory_database().unwrap();
        let mut older = Document::new_processing("first.pdf", "uploads/first.pdf");
        older.created_at = chrono::Utc::now().naive_utc() - chrono::Duration::hours(2);
        let newer = Document::new_processing("second.pdf", "uploads/second.pdf");
        insert_document(&conn, &older).unwrap();
        insert_document(&conn, &newer).unwrap();

        let docs = list_documents(&conn).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].filename, "second.pdf");
        assert_eq!(docs[1].filename, "first.pdf");
    }

    #[test]
    fn mark_completed_sets_terminal_fields() {
        let conn = open_memory_database().unwrap();
        let doc = Document::new_processing("sof.pdf", "uploads/sof.pdf");
        insert_document(&conn, &doc).unwrap();

        mark_completed(&conn, &doc.id, 7, 85.0, 12.5).unwrap();

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(fetched.status, DocumentStatus::Completed);
        assert_eq!(fetched.events_count, 7);
        assert_eq!(fetched.confidence_score, Some(85.0));
        assert!(fetched.completed_at.is_some());
        assert!(fetched.error_message.is_none());
    }

    #[test]
    fn mark_failed_records_message() {
        let conn = open_memory_database().unwrap();
        let doc = Document::new_processing("sof.pdf", "uploads/sof.pdf");
        insert_document(&conn, &doc).unwrap();

        mark_failed(&conn, &doc.id, "Rate limit exceeded, try again shortly").unwrap();

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(fetched.status, DocumentStatus::Failed);
        assert_eq!(
            fetched.error_message.as_deref(),
            Some("Rate limit exceeded, try again shortly")
        );
    }

    #[test]
    fn terminal_documents_are_never_reopened() {
        let conn = open_memory_database().unwrap();
        let doc = Document::new_processing("sof.pdf", "uploads/sof.pdf");
        insert_document(&conn, &doc).unwrap();
        mark_completed(&conn, &doc.id, 3, 100.0, 1.0).unwrap();

        assert!(mark_failed(&conn, &doc.id, "late failure").is_err());
        assert!(mark_completed(&conn, &doc.id, 9, 50.0, 2.0).is_err());

        let fetched = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(fetched.status, DocumentStatus::Completed);
        assert_eq!(fetched.events_count, 3);
    }

    #[test]
    fn stale_sweep_fails_old_processing_docs_only() {
        let conn = open_memory_database().unwrap();

        let mut stuck = Document::new_processing("stuck.pdf", "uploads/stuck.pdf");
        stuck.created_at = chrono::Utc::now().naive_utc() - chrono::Duration::hours(1);
        insert_document(&conn, &stuck).unwrap();

        let fresh = Document::new_processing("fresh.pdf", "uploads/fresh.pdf");
        insert_document(&conn, &fresh).unwrap();

        let mut done = Document::new_processing("done.pdf", "uploads/done.pdf");
        done.created_at = chrono::Utc::now().naive_utc() - chrono::Duration::hours(1);
        insert_document(&conn, &done).unwrap();
        mark_completed(&conn, &done.id, 1, 100.0, 1.0).unwrap();

        let failed = fail_stale_processing(&conn, 600).unwrap();
        assert_eq!(failed, vec![stuck.id]);

        let stuck = get_document(&conn, &stuck.id).unwrap().unwrap();
        assert_eq!(stuck.status, DocumentStatus::Failed);
        assert_eq!(stuck.error_message.as_deref(), Some("Processing timed out"));

        let fresh = get_document(&conn, &fresh.id).unwrap().unwrap();
        assert_eq!(fresh.status, DocumentStatus::Processing);
        let done = get_document(&conn, &done.id).unwrap().unwrap();
        assert_eq!(done.status, DocumentStatus::Completed);
    }
}
