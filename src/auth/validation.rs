//! Credential validation for Academia.
//!
//! This module provides validation functions for usernames and passwords
//! supplied at registration.

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 1;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 1;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    #[error("username is required")]
    UsernameEmpty,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains control characters or surrounding whitespace.
    #[error("username contains invalid characters")]
    UsernameInvalidChars,

    /// Password is empty.
    #[error("password is required")]
    PasswordEmpty,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,
}

/// Validate a username.
///
/// Requirements:
/// - Length: 1-32 characters
/// - No control characters, no leading or trailing whitespace
///
/// # Examples
///
/// ```
/// use academia::auth::validation::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if length < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameEmpty);
    }
    if length > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if username.chars().any(|c| c.is_control()) || username.trim() != username {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate a password.
///
/// Requirements:
/// - Length: 1-128 characters
///
/// # Examples
///
/// ```
/// use academia::auth::validation::validate_password;
///
/// assert!(validate_password("pw1").is_ok());
/// assert!(validate_password("").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordEmpty);
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Validate all registration fields at once.
///
/// Returns the first validation error encountered, or Ok if all fields are valid.
pub fn validate_registration(username: &str, password: &str) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_password(password)?;
    Ok(())
}
