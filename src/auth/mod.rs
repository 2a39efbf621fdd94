//! Authentication module for Academia.
//!
//! This module provides password hashing, bearer tokens, role checks,
//! user registration, and login.

mod login;
mod password;
pub mod permission;
mod registration;
mod token;
pub mod validation;

pub use login::{authenticate, LoginError};
pub use password::{hash_password, verify_password, PasswordError};
pub use permission::{check_permission, PermissionError};
pub use registration::{register, RegistrationError, RegistrationRequest};
pub use token::{Claims, TokenError, TokenIssuer, DEFAULT_TOKEN_EXPIRY_SECS};
pub use validation::ValidationError;
