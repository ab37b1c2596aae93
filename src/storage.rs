//! File storage behind the pipeline.
//!
//! Uploads land in a storage root on disk; the pipeline only ever reads
//! them back by their relative path. The trait exists so tests can run
//! against an in-memory store.

use std::collections::HashMap;
use std::io;
use std::path::{Component, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File not found in storage: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Read/write access to stored upload files.
pub trait FileStore: Send + Sync {
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Disk-backed store rooted at a single directory.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a relative storage path under the root. Absolute paths and
    /// parent traversal are rejected.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = PathBuf::from(path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStore for LocalFileStore {
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        match std::fs::read(&full) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, bytes)?;
        Ok(())
    }
}

/// In-memory store for testing.
pub struct MockFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockFileStore {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_file(self, path: &str, bytes: &[u8]) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.to_string(), bytes.to_vec());
        }
        self
    }
}

impl Default for MockFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore for MockFileStore {
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let files = self
            .files
            .lock()
            .map_err(|_| StorageError::InvalidPath("store lock poisoned".into()))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| StorageError::InvalidPath("store lock poisoned".into()))?;
        files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}
