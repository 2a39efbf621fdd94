//! Stored file retrieval for the local object store.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::AppState;
use crate::web::error::{ApiError, ErrorBody};
use crate::AcademiaError;

/// Length of the uuid prefix the local store puts before each file name.
const UUID_PREFIX_LEN: usize = 36;

/// Name shown to the user for a stored file: the stored name without its
/// uuid prefix.
fn display_name(storage_id: &str) -> &str {
    let (Some(prefix), Some(rest)) = (
        storage_id.get(..UUID_PREFIX_LEN),
        storage_id.get(UUID_PREFIX_LEN..),
    ) else {
        return storage_id;
    };

    if uuid::Uuid::parse_str(prefix).is_err() {
        return storage_id;
    }
    rest.strip_prefix('-')
        .filter(|name| !name.is_empty())
        .unwrap_or(storage_id)
}

/// Build an inline Content-Disposition header value.
///
/// Non-ASCII names get an RFC 5987 `filename*` parameter next to a
/// sanitized ASCII fallback.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename.chars().any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("inline; filename=\"{}\"", filename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// GET /files/:storage_id - Serve a stored document.
#[utoipa::path(
    get,
    path = "/files/{storage_id}",
    tag = "files",
    params(
        ("storage_id" = String, Path, description = "Storage identifier")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/pdf"),
        (status = 404, description = "File not found", body = ErrorBody)
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(storage_id): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.store.get(&storage_id).await.map_err(|e| match e {
        AcademiaError::NotFound(_) | AcademiaError::Validation(_) => {
            ApiError::not_found("File not found")
        }
        other => ApiError::from(other),
    })?;

    let mime = mime_guess::from_path(&storage_id).first_or_octet_stream();
    let disposition = content_disposition_header(display_name(&storage_id));

    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, max-age=3600"),
    );

    Ok(response)
}
