use axum::{
    Router,
    extract::{Path, State},
    response::Response,
    routing::get,
};

use crate::{error::AppResult, services::file_service, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(download_file))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}",
    params(
        ("id" = String, Path, description = "Stored file ID")
    ),
    responses(
        (status = 200, description = "File content with its original name and type", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 400, description = "Malformed file id"),
        (status = 404, description = "File not found"),
    ),
    tag = "Files"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let blob = file_service::download(&state, &id).await?;
    tracing::debug!(file_id = %id, length = blob.bytes.len(), "serving file");
    file_service::into_response(blob)
}
