use axum::{
    extract::{Json, Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
};
use uuid::Uuid;

use core_pitch::storage::content_type_for;
use data_model_pitch::models::{UploadError, UploadResponse};

use crate::state::AppState;

/// Largest accepted image.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Request body cap for the upload routes: the image plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

const ALLOWED_MIME_TYPES: [&str; 5] = ["image/jpeg", "image/png", "image/gif", "image/webp", "image/svg+xml"];
const ALLOWED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Lowercased extension of `filename` if it is an allowed image extension.
fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn multipart_error(e: MultipartError) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge
    } else {
        tracing::warn!("Malformed multipart upload: {}", e.body_text());
        UploadError::MissingFile
    }
}

/// Stores the first file found under `field_name` as `uploads/<uuid>.<ext>`.
async fn receive_image(
    state: &AppState,
    headers: &HeaderMap,
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Json<UploadResponse>, UploadError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let mime = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(UploadError::DisallowedType(mime));
        }
        let Some(ext) = allowed_extension(&original_name) else {
            return Err(UploadError::DisallowedType(original_name));
        };

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(UploadError::MissingFile);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge);
        }

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = format!("uploads/{}", filename);
        let (stored, _) = state
            .pages
            .write_through(&path, bytes.to_vec(), content_type_for(&ext))
            .await?;
        tracing::info!("Stored upload '{}' ({} bytes) as {}", original_name, bytes.len(), path);

        return Ok(Json(UploadResponse {
            success: true,
            url: state.absolute_url(headers, &stored.url),
            filename,
        }));
    }
    Err(UploadError::MissingFile)
}

/// POST /api/upload-logo - Multipart field `logo`
pub async fn post_upload_logo(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    receive_image(&state, &headers, multipart, "logo").await
}

/// POST /api/upload-image - Multipart field `image`
pub async fn post_upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    receive_image(&state, &headers, multipart, "image").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("logo.PNG"), Some("png".to_string()));
        assert_eq!(allowed_extension("my.logo.svg"), Some("svg".to_string()));
        assert_eq!(allowed_extension("logo.exe"), None);
        assert_eq!(allowed_extension("logo"), None);
    }
}
