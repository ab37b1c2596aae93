//! Document processing runs: storage read, extraction, persistence, and
//! the terminal status transition.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{
    insert_events, mark_completed, mark_failed, ChangeKind, ChangeNotifier, DatabaseError, Table,
};
use crate::storage::FileStore;

use super::agent::ExtractionAgent;
use super::ProcessingError;

/// One processing invocation.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub file_path: String,
    pub file_name: String,
    pub document_id: Option<Uuid>,
}

/// Drives a document from stored bytes to a terminal status.
///
/// Holds the shared connection itself and locks it only around DB
/// writes, so the storage read and the completion calls (which can run
/// for minutes) never block other connection users.
pub struct DocumentProcessor {
    agent: ExtractionAgent,
    files: Box<dyn FileStore>,
    db: Arc<Mutex<Connection>>,
    notifier: ChangeNotifier,
}

impl DocumentProcessor {
    pub fn new(
        agent: ExtractionAgent,
        files: Box<dyn FileStore>,
        db: Arc<Mutex<Connection>>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            agent,
            files,
            db,
            notifier,
        }
    }

    fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.db.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Process one document end to end. Returns the number of events
    /// extracted and persisted.
    ///
    /// Every failure inside the run is caught here: when a document id is
    /// known, the document transitions to `failed` with the error's
    /// message before the error is returned. Zero extracted events is a
    /// successful run, not a failure.
    pub fn process(&self, request: &ProcessRequest) -> Result<u32, ProcessingError> {
        let started = Instant::now();
        tracing::info!(
            file_name = %request.file_name,
            document_id = ?request.document_id,
            "Processing document"
        );

        match self.run(request, started) {
            Ok(count) => Ok(count),
            Err(err) => {
                if let Some(id) = request.document_id {
                    match self.mark_run_failed(&id, &err.to_string()) {
                        Ok(()) => {
                            self.notifier
                                .publish(Table::Documents, ChangeKind::Updated, Some(id));
                        }
                        Err(mark_err) => {
                            tracing::warn!(
                                document_id = %id,
                                error = %mark_err,
                                "Could not mark document failed"
                            );
                        }
                    }
                }
                tracing::warn!(file_name = %request.file_name, error = %err, "Processing failed");
                Err(err)
            }
        }
    }

    fn run(&self, request: &ProcessRequest, started: Instant) -> Result<u32, ProcessingError> {
        let bytes = self.files.read(&request.file_path)?;
        let current_date = chrono::Utc::now().date_naive();

        let outcome = self.agent.extract(
            request.document_id,
            &request.file_name,
            &bytes,
            current_date,
        )?;
        let count = outcome.events.len() as u32;

        // Events and the terminal transition commit together. If the
        // document left `processing` mid-run (stale sweep, racing
        // actor) the rejected transition rolls the events back too.
        {
            let conn = self.lock_db()?;
            let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
            insert_events(&tx, &outcome.events)?;
            if let Some(id) = request.document_id {
                let elapsed = started.elapsed().as_secs_f32();
                mark_completed(&tx, &id, count, outcome.confidence, elapsed)?;
            }
            tx.commit().map_err(DatabaseError::from)?;
        }

        if !outcome.events.is_empty() {
            self.notifier
                .publish(Table::Events, ChangeKind::Inserted, request.document_id);
        }
        if let Some(id) = request.document_id {
            self.notifier
                .publish(Table::Documents, ChangeKind::Updated, Some(id));
        }

        tracing::info!(
            file_name = %request.file_name,
            events = count,
            confidence = outcome.confidence,
            "Document completed"
        );
        Ok(count)
    }

    fn mark_run_failed(&self, id: &Uuid, message: &str) -> Result<(), DatabaseError> {
        let conn = self.lock_db()?;
        mark_failed(&conn, id, message)
    }
}
