use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db::ChangeNotifier;
use crate::pipeline::DocumentProcessor;

/// Shared state handed to every handler.
///
/// The SQLite connection sits behind a mutex; handlers doing blocking
/// DB or pipeline work take the lock inside `spawn_blocking`.
#[derive(Clone)]
pub struct AppContext {
    pub db: Arc<Mutex<Connection>>,
    pub processor: Arc<DocumentProcessor>,
    pub notifier: ChangeNotifier,
}

impl AppContext {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        processor: Arc<DocumentProcessor>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            db,
            processor,
            notifier,
        }
    }

    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}
