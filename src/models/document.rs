use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;

/// Processing lifecycle of an uploaded document.
///
/// `Completed` and `Failed` are terminal. A document never moves back to
/// `Processing`; re-uploading the same file creates a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(DatabaseError::InvalidEnum {
                field: "DocumentStatus".into(),
                value: s.into(),
            }),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded schedule document and its extraction outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub status: DocumentStatus,
    pub events_count: u32,
    pub error_message: Option<String>,
    pub confidence_score: Option<f32>,
    pub processing_time_seconds: Option<f32>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Document {
    /// New document entering the pipeline.
    pub fn new_processing(filename: &str, file_path: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            file_path: file_path.to_string(),
            status: DocumentStatus::Processing,
            events_count: 0,
            error_message: None,
            confidence_score: None,
            processing_time_seconds: None,
            created_at: chrono::Utc::now().naive_utc(),
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            DocumentStatus::Processing,
            DocumentStatus::Completed,
            DocumentStatus::Failed,
        ] {
            assert_eq!(DocumentStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(DocumentStatus::from_str("queued").is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!DocumentStatus::Processing.is_terminal());
        assert!(DocumentStatus::Completed.is_terminal());
        assert!(DocumentStatus::Failed.is_terminal());
    }

    #[test]
    fn new_document_starts_processing() {
        let doc = Document::new_processing("sof.pdf", "uploads/sof.pdf");
        assert_eq!(doc.status, DocumentStatus::Processing);
        assert_eq!(doc.events_count, 0);
        assert!(doc.error_message.is_none());
        assert!(doc.completed_at.is_none());
    }
}
