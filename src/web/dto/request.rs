//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::validation::no_control_chars;

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username.
    #[validate(
        length(min = 1, max = 32, message = "Username must be 1-32 characters"),
        custom(function = "no_control_chars")
    )]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, max = 128, message = "Password must be 1-128 characters"))]
    pub password: String,
    /// Requested role; defaults to student.
    #[serde(default)]
    pub role: Option<String>,
}

/// Role change request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    /// New role.
    pub role: String,
}

/// Multipart body of `POST /resources/upload`.
///
/// Documentation only; the handler reads the parts directly.
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UploadForm {
    /// Document title.
    pub title: String,
    /// Exam year.
    pub year: i64,
    /// Course code, e.g. "CS101".
    pub subject_code: String,
    /// Exam type, e.g. "midterm".
    pub exam_type: String,
    /// PDF document.
    #[schema(format = Binary)]
    pub file: String,
}

/// Multipart body of `PUT /resources/:id`. Omitted parts keep their values.
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UpdateForm {
    pub title: Option<String>,
    pub year: Option<i64>,
    pub subject_code: Option<String>,
    pub exam_type: Option<String>,
    /// Replacement PDF document.
    #[schema(format = Binary)]
    pub file: Option<String>,
}
