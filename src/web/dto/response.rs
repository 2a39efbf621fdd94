//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::datetime::to_rfc3339;
use crate::db::User;
use crate::resource::Resource;

/// Plain message response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth DTOs
// ============================================================================

/// Login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub token: String,
    /// User role.
    pub role: String,
}

/// User summary for user management.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// User role.
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
        }
    }
}

// ============================================================================
// Resource DTOs
// ============================================================================

/// Resource representation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    /// Resource ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Year.
    pub year: i64,
    /// Subject code.
    pub subject_code: String,
    /// Exam type.
    pub exam_type: String,
    /// Fully-qualified retrieval URL.
    pub file_path: String,
    /// Object store identifier.
    pub storage_id: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<Resource> for ResourceResponse {
    fn from(resource: Resource) -> Self {
        Self {
            id: resource.id,
            title: resource.title,
            year: resource.year,
            subject_code: resource.subject_code,
            exam_type: resource.exam_type,
            file_path: resource.file_url,
            storage_id: resource.storage_id,
            created_at: to_rfc3339(&resource.created_at),
        }
    }
}

/// Response for upload and replace.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Message.
    pub message: String,
    /// Retrieval URL of the stored file.
    pub file_url: String,
    /// The resource as stored.
    pub resource: ResourceResponse,
}

impl UploadResponse {
    /// Create an upload response for a resource.
    pub fn new(message: impl Into<String>, resource: Resource) -> Self {
        let resource = ResourceResponse::from(resource);
        Self {
            message: message.into(),
            file_url: resource.file_path.clone(),
            resource,
        }
    }
}
