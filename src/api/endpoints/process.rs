//! `POST /api/process` — run the extraction pipeline over a stored upload.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::AppContext;
use crate::pipeline::ProcessRequest;

#[derive(Deserialize)]
pub struct ProcessBody {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "documentId", default)]
    pub document_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(rename = "eventsExtracted")]
    pub events_extracted: u32,
    pub message: String,
}

/// Invoke a processing run. The blocking pipeline work (storage read,
/// completion calls, DB writes) runs on the blocking pool.
pub async fn run(
    State(ctx): State<AppContext>,
    Json(body): Json<ProcessBody>,
) -> Result<Json<ProcessResponse>, ApiError> {
    if body.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("fileName must not be empty".into()));
    }
    if body.file_path.trim().is_empty() {
        return Err(ApiError::BadRequest("filePath must not be empty".into()));
    }

    let request = ProcessRequest {
        file_path: body.file_path,
        file_name: body.file_name,
        document_id: body.document_id,
    };

    let events_extracted = tokio::task::spawn_blocking(move || {
        // The processor locks the shared connection itself, only around
        // its DB writes, so other handlers keep serving mid-run.
        ctx.processor.process(&request).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("processing task panicked: {e}")))??;

    Ok(Json(ProcessResponse {
        success: true,
        events_extracted,
        message: "PDF processed successfully".to_string(),
    }))
}
