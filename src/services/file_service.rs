use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use uuid::Uuid;

use crate::{
    blob_store::StoredBlob,
    dto::files::UploadedFile,
    error::{AppError, AppResult},
    models::{FileInfo, file_url},
    state::AppState,
};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Stores one upload. Failures are logged and reported with the generic upload error.
pub async fn store_upload(state: &AppState, file: &UploadedFile) -> AppResult<FileInfo> {
    match state
        .blobs
        .upload(&file.file_name, &file.content_type, &file.bytes)
        .await
    {
        Ok(info) => Ok(FileInfo {
            file_name: info.file_name,
            source_id: info.id,
            content_type: info.content_type,
            file_length: info.length,
            url: file_url(info.id),
        }),
        Err(err) => {
            tracing::error!(error = %err, file_name = %file.file_name, "file upload failed");
            Err(AppError::Upload)
        }
    }
}

/// Stores a batch of uploads, skipping empty files.
///
/// If any upload fails, the blobs already written for this batch are removed.
pub async fn upload_files(state: &AppState, files: &[UploadedFile]) -> AppResult<Vec<FileInfo>> {
    let mut stored: Vec<FileInfo> = Vec::with_capacity(files.len());
    for file in files {
        if file.is_empty() {
            continue;
        }
        match store_upload(state, file).await {
            Ok(info) => stored.push(info),
            Err(err) => {
                let written: Vec<Uuid> = stored.iter().map(|f| f.source_id).collect();
                discard(state, written).await;
                return Err(err);
            }
        }
    }
    Ok(stored)
}

/// Best-effort removal of blobs that are no longer referenced.
pub async fn discard(state: &AppState, ids: Vec<Uuid>) {
    for id in ids {
        if let Err(err) = state.blobs.delete(id).await {
            tracing::warn!(error = %err, blob_id = %id, "failed to discard blob");
        }
    }
}

pub async fn download(state: &AppState, id: &str) -> AppResult<StoredBlob> {
    let id = Uuid::parse_str(id).map_err(|_| AppError::BadRequest("invalid file id".into()))?;
    Ok(state.blobs.download(id).await?)
}

/// Builds the download response, replaying stored metadata as headers.
pub fn into_response(blob: StoredBlob) -> AppResult<Response> {
    let content_type = HeaderValue::from_str(&blob.info.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&content_disposition(&blob.info.file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, blob.bytes.len())
        .body(Body::from(blob.bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

fn content_disposition(file_name: &str) -> String {
    let escaped: String = file_name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{escaped}\"")
}
