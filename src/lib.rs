//! Academia - academic resource sharing server
//!
//! A REST backend where faculty upload exam papers and other PDF documents
//! and students browse them. Document metadata lives in SQLite; the files
//! themselves live in an object store (local directory or Cloudinary).

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod resource;
pub mod storage;
pub mod web;

pub use auth::{
    authenticate, check_permission, hash_password, register, verify_password, Claims,
    LoginError, PasswordError, PermissionError, RegistrationError, RegistrationRequest,
    TokenError, TokenIssuer, ValidationError,
};
pub use config::Config;
pub use db::{Database, DatabaseProvider, NewUser, Role, SharedDatabase, User, UserRepository};
pub use error::{AcademiaError, Result};
pub use resource::{Resource, ResourceCoordinator, ResourceRepository};
pub use storage::{LocalObjectStore, ObjectRef, ObjectStore, SharedObjectStore};
