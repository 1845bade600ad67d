//! # Upload Handler
//!
//! Extracts a single uploaded file and returns its (possibly truncated) text,
//! so a client can preview an attachment before sending it.

use super::{AppError, AppState};
use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use promptdesk::ingest;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize, Debug)]
pub struct UploadResponse {
    pub filename: String,
    pub file_type: String,
    pub content: String,
    pub truncated: bool,
    /// Character length of the extracted text before truncation.
    pub size: usize,
    pub encoding: Option<&'static str>,
}

/// Handler for `POST /api/upload`.
pub async fn upload_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload.txt").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                upload = Some((filename, bytes.to_vec()));
            }
            _ => warn!("Ignoring unknown multipart field: {}", name),
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("Missing 'file' part.".to_string()))?;
    info!(filename = %filename, bytes = bytes.len(), "Upload received.");

    let options = ingest::ExtractOptions {
        text_encoding: app_state.config.text_encoding_policy,
        timeout: Some(std::time::Duration::from_secs(
            app_state.config.extraction_timeout_secs,
        )),
    };
    let extraction = ingest::extract_with_timeout(&filename, bytes, &options).await?;

    let size = extraction.text.chars().count();
    let (content, truncated) = app_state
        .assembler
        .budget()
        .truncate_attachment(&extraction.text);

    Ok(Json(UploadResponse {
        filename,
        file_type: extraction.format.as_str().to_string(),
        content,
        truncated,
        size,
        encoding: extraction.encoding,
    }))
}
