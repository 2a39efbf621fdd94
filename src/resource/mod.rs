//! Academic resources for Academia.
//!
//! This module provides:
//! - Resource records and their repository
//! - Upload validation for files and metadata fields
//! - The coordinator that keeps records and stored files consistent

mod coordinator;
mod repository;
mod types;
mod upload;

pub use coordinator::ResourceCoordinator;
pub use repository::ResourceRepository;
pub use types::{NewResource, Resource, ResourceChanges, ResourceDraft, ResourceUpdate};
pub use upload::{parse_year, FileUpload, ResourceFields, ALLOWED_CONTENT_TYPES, MAX_YEAR};

/// Default maximum upload size (20MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 20 * 1024 * 1024;
