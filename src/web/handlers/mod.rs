//! API handlers for the Academia web API.

pub mod auth;
pub mod files;
pub mod resource;

pub use auth::*;
pub use files::*;
pub use resource::*;

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::db::SharedDatabase;
use crate::resource::{ResourceCoordinator, DEFAULT_MAX_UPLOAD_SIZE};
use crate::storage::SharedObjectStore;
use crate::web::error::ApiError;
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lazily opened database.
    pub db: SharedDatabase,
    /// Object store for uploaded documents.
    pub store: SharedObjectStore,
    /// Bearer token issuer.
    pub tokens: Arc<TokenIssuer>,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: SharedDatabase, store: SharedObjectStore, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            db,
            store,
            tokens,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_upload_size(mut self, max_upload_size: u64) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    /// Get the database, opening the pool on first use.
    pub async fn database(&self) -> Result<&Database, ApiError> {
        self.db.get().await.map_err(ApiError::from)
    }

    /// Build a resource coordinator over `db` and this state's object store.
    pub fn coordinator<'a>(&'a self, db: &'a Database) -> ResourceCoordinator<'a> {
        ResourceCoordinator::new(db, self.store.as_ref())
            .with_max_upload_size(self.max_upload_size)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("store", &self.store.name())
            .field("max_upload_size", &self.max_upload_size)
            .finish()
    }
}
