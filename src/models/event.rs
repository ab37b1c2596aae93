use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dated operational event extracted from a schedule document.
///
/// `end_time` earlier than `start_time` is stored as-is and read as an
/// interval crossing midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub id: Uuid,
    pub document_id: Option<Uuid>,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub description: String,
    pub source_pdf: String,
    pub created_at: NaiveDateTime,
}

impl ScheduleEvent {
    pub fn new(
        document_id: Option<Uuid>,
        event_date: NaiveDate,
        start_time: NaiveTime,
        end_time: Option<NaiveTime>,
        description: &str,
        source_pdf: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            event_date,
            start_time,
            end_time,
            description: description.to_string(),
            source_pdf: source_pdf.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
