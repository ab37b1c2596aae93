pub mod agent;
pub mod completion;
pub mod normalize;
pub mod parser;
pub mod processor;
pub mod prompt;

pub use agent::*;
pub use completion::*;
pub use normalize::*;
pub use parser::*;
pub use processor::*;
pub use prompt::*;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::storage::StorageError;

/// Errors from the completion passes of the extraction agent.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Completion service unreachable at {0}")]
    Connection(String),

    #[error("Completion request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Rate limit exceeded, try again shortly")]
    RateLimited,

    #[error("API quota exhausted, check the account plan and billing")]
    QuotaExhausted,

    #[error("Completion service returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Document transcription came back empty")]
    EmptyTranscript,
}

/// Errors from a full document processing run.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
