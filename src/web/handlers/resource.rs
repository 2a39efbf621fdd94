//! Resource handlers.

use axum::{
    async_trait,
    extract::{
        multipart::{Field, Multipart, MultipartError},
        FromRequestParts, Path, State,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::resource::{FileUpload, ResourceFields};
use crate::web::dto::{
    MessageResponse, ResourceResponse, UpdateForm, UploadForm, UploadResponse,
};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::middleware::{AdminUser, AuthUser, FacultyUser};

/// Resource id taken from the path.
///
/// Anything that is not an integer cannot name a resource and is answered
/// with 404 rather than a routing error.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found("Resource not found"))?;
        raw.parse()
            .map(ResourceId)
            .map_err(|_| ApiError::not_found("Resource not found"))
    }
}

/// Metadata fields and optional file collected from a multipart body.
struct ResourceForm {
    fields: ResourceFields,
    file: Option<FileUpload>,
}

fn multipart_error(err: MultipartError, max_upload_size: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let max_mb = max_upload_size / 1024 / 1024;
        return ApiError::invalid(format!("File too large (max {max_mb}MB)"));
    }
    tracing::warn!("Failed to read multipart body: {}", err);
    ApiError::bad_request("Invalid multipart data")
}

async fn read_file(field: Field<'_>, max_upload_size: u64) -> Result<Option<FileUpload>, ApiError> {
    let file_name = field.file_name().unwrap_or("").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| multipart_error(e, max_upload_size))?;

    // Browsers send an empty part for an untouched file input
    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }

    let mut upload = FileUpload::new(file_name, bytes.to_vec());
    if let Some(content_type) = content_type {
        upload = upload.with_content_type(content_type);
    }
    Ok(Some(upload))
}

async fn read_form(
    mut multipart: Multipart,
    max_upload_size: u64,
) -> Result<ResourceForm, ApiError> {
    let mut fields = ResourceFields::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_size))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            if let Some(upload) = read_file(field, max_upload_size).await? {
                file = Some(upload);
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| multipart_error(e, max_upload_size))?;
        if !fields.set(&name, value) {
            tracing::debug!(field = %name, "Ignoring unknown form field");
        }
    }

    Ok(ResourceForm { fields, file })
}

/// GET /resources - List all resources, newest first.
#[utoipa::path(
    get,
    path = "/resources",
    tag = "resources",
    responses(
        (status = 200, description = "All resources", body = Vec<ResourceResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    AuthUser(_claims): AuthUser,
) -> Result<Json<Vec<ResourceResponse>>, ApiError> {
    let db = state.database().await?;
    let resources = state.coordinator(db).list().await?;
    Ok(Json(
        resources.into_iter().map(ResourceResponse::from).collect(),
    ))
}

/// GET /resources/:id - Get a single resource.
#[utoipa::path(
    get,
    path = "/resources/{id}",
    tag = "resources",
    params(
        ("id" = i64, Path, description = "Resource ID")
    ),
    responses(
        (status = 200, description = "Resource", body = ResourceResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Resource not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    AuthUser(_claims): AuthUser,
    ResourceId(id): ResourceId,
) -> Result<Json<ResourceResponse>, ApiError> {
    let db = state.database().await?;
    let resource = state.coordinator(db).get(id).await?;
    Ok(Json(ResourceResponse::from(resource)))
}

/// GET /resources/upload - Not a resource; only uploads are accepted here.
pub async fn upload_path_lookup(AuthUser(_claims): AuthUser) -> ApiError {
    ApiError::not_found("Resource not found")
}

/// POST /resources/upload - Upload a new document (faculty or admin).
#[utoipa::path(
    post,
    path = "/resources/upload",
    tag = "resources",
    request_body(
        content = UploadForm,
        content_type = "multipart/form-data",
        description = "Resource metadata and a PDF file"
    ),
    responses(
        (status = 201, description = "Resource uploaded", body = UploadResponse),
        (status = 400, description = "Missing fields or invalid file", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Faculty or admin access required", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_resource(
    State(state): State<Arc<AppState>>,
    FacultyUser(claims): FacultyUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let form = read_form(multipart, state.max_upload_size).await?;
    let draft = form.fields.into_draft()?;
    let file = form
        .file
        .ok_or_else(|| ApiError::invalid("Missing required fields: file"))?;

    let db = state.database().await?;
    let resource = state.coordinator(db).create(draft, file).await?;

    tracing::info!(
        user_id = claims.sub,
        resource_id = resource.id,
        "Resource uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse::new("Resource uploaded successfully", resource)),
    ))
}

/// PUT /resources/:id - Update metadata and optionally replace the file (faculty or admin).
#[utoipa::path(
    put,
    path = "/resources/{id}",
    tag = "resources",
    params(
        ("id" = i64, Path, description = "Resource ID")
    ),
    request_body(
        content = UpdateForm,
        content_type = "multipart/form-data",
        description = "Any metadata field and an optional PDF file"
    ),
    responses(
        (status = 200, description = "Resource updated", body = UploadResponse),
        (status = 400, description = "Invalid field or file", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Faculty or admin access required", body = ErrorBody),
        (status = 404, description = "Resource not found", body = ErrorBody),
        (status = 500, description = "Storage or database failure", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    FacultyUser(claims): FacultyUser,
    ResourceId(id): ResourceId,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_form(multipart, state.max_upload_size).await?;
    let changes = form.fields.into_changes()?;

    let db = state.database().await?;
    let resource = state.coordinator(db).replace(id, changes, form.file).await?;

    tracing::info!(user_id = claims.sub, resource_id = id, "Resource updated");

    Ok(Json(UploadResponse::new(
        "Resource updated successfully",
        resource,
    )))
}

/// DELETE /resources/:id - Delete a resource and its file (admin only).
#[utoipa::path(
    delete,
    path = "/resources/{id}",
    tag = "resources",
    params(
        ("id" = i64, Path, description = "Resource ID")
    ),
    responses(
        (status = 200, description = "Resource deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Resource not found", body = ErrorBody),
        (status = 500, description = "Database failure", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    ResourceId(id): ResourceId,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = state.database().await?;
    state.coordinator(db).delete(id).await?;

    tracing::info!(user_id = claims.sub, resource_id = id, "Resource deleted");

    Ok(Json(MessageResponse::new("Resource deleted successfully")))
}
