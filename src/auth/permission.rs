//! Permission checking for Academia.
//!
//! Role-based access control predicates over verified token claims.

use thiserror::Error;

use super::token::Claims;
use crate::db::Role;

/// Permission-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// No valid token was presented.
    #[error("authentication required")]
    NotAuthenticated,

    /// User does not have sufficient permission.
    #[error("{0} access required")]
    InsufficientRole(Role),

    /// The token carries a role this server does not know.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Check if the holder of `claims` has the required permission level.
///
/// Returns the parsed role on success. Unknown role strings never pass a
/// role check.
///
/// # Examples
///
/// ```
/// use academia::auth::permission::{check_permission, PermissionError};
/// use academia::db::Role;
///
/// assert!(matches!(
///     check_permission(None, Role::Student),
///     Err(PermissionError::NotAuthenticated)
/// ));
/// ```
pub fn check_permission(claims: Option<&Claims>, required: Role) -> Result<Role, PermissionError> {
    let claims = claims.ok_or(PermissionError::NotAuthenticated)?;
    let role = claims
        .role()
        .ok_or_else(|| PermissionError::UnknownRole(claims.role.clone()))?;

    if !role.can_access(required) {
        return Err(PermissionError::InsufficientRole(required));
    }

    Ok(role)
}

/// Require faculty or admin role.
pub fn require_faculty_or_admin(claims: &Claims) -> Result<Role, PermissionError> {
    check_permission(Some(claims), Role::Faculty)
}

/// Require admin role.
pub fn require_admin(claims: &Claims) -> Result<Role, PermissionError> {
    check_permission(Some(claims), Role::Admin)
}
