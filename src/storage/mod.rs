//! Object storage for Academia.
//!
//! Uploaded documents live in an object store outside the database. The
//! [`ObjectStore`] trait is the seam between the resource coordinator and a
//! concrete backend:
//! - [`LocalObjectStore`]: sharded directory on disk, served under `/files`
//! - [`CloudinaryStore`]: Cloudinary raw uploads over HTTPS

mod cloudinary;
mod local;

pub use cloudinary::{sign_params, CloudinaryStore};
pub use local::LocalObjectStore;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{Config, StorageBackend};
use crate::Result;

/// Location of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    /// Fully-qualified retrieval URL.
    pub url: String,
    /// Identifier the store uses for later get/delete calls.
    pub storage_id: String,
}

/// Backend that holds uploaded document bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Store `bytes`, deriving the object name from `suggested_name`.
    ///
    /// The returned storage id comes from the upload result alone.
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<ObjectRef>;

    /// Fetch an object. Returns `NotFound` if it does not exist.
    async fn get(&self, storage_id: &str) -> Result<Vec<u8>>;

    /// Delete an object. Returns `false` if it did not exist.
    async fn delete(&self, storage_id: &str) -> Result<bool>;

    /// Recover a storage id from a retrieval URL.
    ///
    /// Only used for records that predate persisted storage ids. Path
    /// segments are percent-decoded before the id is extracted.
    fn storage_id_from_url(&self, url: &str) -> Option<String>;
}

/// Shared object store handle.
pub type SharedObjectStore = Arc<dyn ObjectStore>;

/// Build the object store selected in the configuration.
pub fn open(config: &Config) -> Result<SharedObjectStore> {
    match config.storage.backend {
        StorageBackend::Local => {
            let store =
                LocalObjectStore::new(&config.storage.local_path, config.web.public_base_url())?;
            Ok(Arc::new(store))
        }
        StorageBackend::Cloudinary => {
            let store = CloudinaryStore::new(config.storage.cloudinary.clone())?;
            Ok(Arc::new(store))
        }
    }
}

/// Maximum length of the name part kept from a suggested file name.
const MAX_STEM_LENGTH: usize = 64;

/// Split a suggested file name into a safe stem and a lowercase extension.
///
/// The stem keeps letters, digits, spaces, `-`, `_`, and parentheses; any
/// other character becomes `_`. A missing extension becomes `bin`.
pub(crate) fn split_file_name(suggested_name: &str) -> (String, String) {
    let path = Path::new(suggested_name);

    let stem: String = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LENGTH)
        .collect();
    let stem = stem.trim().to_string();
    let stem = if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    };

    let ext: String = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    let ext = if ext.is_empty() { "bin".to_string() } else { ext };

    (stem, ext)
}
