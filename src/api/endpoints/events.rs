//! Event endpoints.
//!
//! - `GET /api/events?source_pdf=...` — events for one source, chronological
//! - `DELETE /api/events/:id` — user-initiated removal

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::AppContext;
use crate::db::{self, ChangeKind, Table};
use crate::models::ScheduleEvent;

#[derive(Deserialize)]
pub struct EventListQuery {
    pub source_pdf: Option<String>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<ScheduleEvent>,
}

/// `GET /api/events?source_pdf=...`
pub async fn list(
    State(ctx): State<AppContext>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let source_pdf = query
        .source_pdf
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("source_pdf query parameter is required".into()))?;

    let conn = ctx.lock_db()?;
    let events = db::get_events_by_source(&conn, &source_pdf)?;
    Ok(Json(EventsResponse { events }))
}

/// `DELETE /api/events/:id`
pub async fn delete(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let event_id =
        Uuid::parse_str(&id).map_err(|e| ApiError::BadRequest(format!("Invalid event ID: {e}")))?;

    {
        let conn = ctx.lock_db()?;
        db::delete_event(&conn, &event_id)?;
    }
    ctx.notifier
        .publish(Table::Events, ChangeKind::Deleted, None);
    tracing::info!(event_id = %event_id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}
