//! Document endpoints.
//!
//! - `POST /api/documents` — register an upload (creates the `processing` row)
//! - `GET /api/documents` — list, newest first
//! - `GET /api/documents/:id` — single document

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::AppContext;
use crate::db::{self, ChangeKind, Table};
use crate::models::Document;

#[derive(Deserialize)]
pub struct RegisterBody {
    pub filename: String,
    #[serde(rename = "filePath", default)]
    pub file_path: Option<String>,
}

#[derive(Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<Document>,
}

/// `POST /api/documents` — create the `processing` row for an upload so
/// the caller holds a document id before invoking the pipeline.
pub async fn register(
    State(ctx): State<AppContext>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<Document>, ApiError> {
    if body.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("filename must not be empty".into()));
    }

    let file_path = body
        .file_path
        .unwrap_or_else(|| format!("uploads/{}", body.filename));
    let doc = Document::new_processing(&body.filename, &file_path);

    {
        let conn = ctx.lock_db()?;
        db::insert_document(&conn, &doc)?;
    }
    ctx.notifier
        .publish(Table::Documents, ChangeKind::Inserted, Some(doc.id));
    tracing::info!(document_id = %doc.id, filename = %doc.filename, "Document registered");

    Ok(Json(doc))
}

/// `GET /api/documents` — all documents, newest upload first.
pub async fn list(State(ctx): State<AppContext>) -> Result<Json<DocumentsResponse>, ApiError> {
    let conn = ctx.lock_db()?;
    let documents = db::list_documents(&conn)?;
    Ok(Json(DocumentsResponse { documents }))
}

/// `GET /api/documents/:id`
pub async fn detail(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let doc_id = Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid document ID: {e}")))?;

    let conn = ctx.lock_db()?;
    db::get_document(&conn, &doc_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Document not found".into()))
}
