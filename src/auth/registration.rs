//! User registration for Academia.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_registration, ValidationError};
use crate::auth::{hash_password, PasswordError};
use crate::db::{NewUser, Role, User, UserRepository};

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Requested role is not one of student, faculty, admin.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Username already exists.
    #[error("username already exists")]
    UsernameExists,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username (1-32 characters).
    pub username: String,
    /// Password (1-128 characters).
    pub password: String,
    /// Requested role; defaults to student when absent.
    pub role: Option<String>,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role: None,
        }
    }

    /// Set the requested role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates the credentials and requested role
/// 2. Checks if the username already exists
/// 3. Hashes the password
/// 4. Creates the user in the database
pub async fn register(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
) -> std::result::Result<User, RegistrationError> {
    validate_registration(&request.username, &request.password)?;

    let role = match request.role.as_deref() {
        None => Role::default(),
        Some(role) => role
            .parse::<Role>()
            .map_err(|_| RegistrationError::InvalidRole(role.to_string()))?,
    };

    if repo
        .username_exists(&request.username)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        return Err(RegistrationError::UsernameExists);
    }

    let password_hash = hash_password(&request.password)?;

    let new_user = NewUser::new(&request.username, password_hash).with_role(role);
    let user = repo.create(&new_user).await.map_err(|e| {
        // Lost a race with a concurrent registration
        if e.to_string().contains("UNIQUE") {
            RegistrationError::UsernameExists
        } else {
            RegistrationError::Database(e.to_string())
        }
    })?;

    info!(
        username = %user.username,
        user_id = user.id,
        role = %user.role,
        "New user registered"
    );

    Ok(user)
}
