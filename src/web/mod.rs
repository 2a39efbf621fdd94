//! Web API module for Academia.
//!
//! REST endpoints for accounts and academic resources, plus retrieval of
//! locally stored files.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use openapi::ApiDoc;
pub use router::create_router;
pub use server::WebServer;
