use std::path::Path as FsPath;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::error::{ApiError, Result};
use crate::schemas::AppState;

/// Content type from the file extension; unknown extensions are served as
/// raw bytes.
fn content_type_for(file_name: &str) -> &'static str {
    let extension = FsPath::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Serve an uploaded image
#[utoipa::path(
    get,
    path = "/image/{filename}",
    tag = "images",
    params(
        ("filename" = String, Path, description = "Stored file key, as returned in avatar and vehicle photo URLs")
    ),
    responses(
        (status = 200, description = "Image bytes with a content type matching the extension"),
        (status = 404, description = "No such image", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let bytes = state
        .content_store
        .load(&filename)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    match bytes {
        Some(bytes) => {
            debug!("Serving {} bytes", bytes.len());
            Ok(([(header::CONTENT_TYPE, content_type_for(&filename))], bytes).into_response())
        }
        None => Err(ApiError::NotFound(format!("Image {} not found", filename))),
    }
}
