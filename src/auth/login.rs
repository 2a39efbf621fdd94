//! Credential verification for Academia.

use thiserror::Error;
use tracing::{debug, info};

use crate::auth::verify_password;
use crate::db::{User, UserRepository};

/// Login errors.
#[derive(Error, Debug)]
pub enum LoginError {
    /// Unknown user or wrong password. The two cases are indistinguishable
    /// to the caller.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Verify a username/password pair and return the matching user.
pub async fn authenticate(
    repo: &UserRepository<'_>,
    username: &str,
    password: &str,
) -> Result<User, LoginError> {
    let user = repo
        .get_by_username(username)
        .await
        .map_err(|e| LoginError::Database(e.to_string()))?
        .ok_or_else(|| {
            debug!(username = %username, "Login for unknown user");
            LoginError::InvalidCredentials
        })?;

    verify_password(password, &user.password).map_err(|e| {
        debug!(username = %username, "Password verification failed: {}", e);
        LoginError::InvalidCredentials
    })?;

    info!(user_id = user.id, role = %user.role, "User logged in");
    Ok(user)
}
