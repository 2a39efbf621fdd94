//! Local filesystem object store.
//!
//! Objects are stored in a sharded directory structure:
//! ```text
//! {base_path}/
//! ├── ab/
//! │   └── ab12cd34-5678-90ab-cdef-123456789012-Midterm 2023.pdf
//! └── cd/
//!     └── cd90ab12-3456-7890-abcd-ef1234567890-notes.pdf
//! ```
//! and served back by this process at `{public_base_url}/files/{storage_id}`.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::{split_file_name, ObjectRef, ObjectStore};
use crate::{AcademiaError, Result};

/// URL path prefix under which stored files are served.
pub const FILES_ROUTE_PREFIX: &str = "/files/";

/// Object store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// Create a new store rooted at `base_path`.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Retrieval URL for a stored name.
    pub fn url_for(&self, storage_id: &str) -> String {
        format!(
            "{}{}{}",
            self.public_base_url,
            FILES_ROUTE_PREFIX,
            urlencoding::encode(storage_id)
        )
    }

    /// Check if an object exists.
    pub async fn exists(&self, storage_id: &str) -> bool {
        match self.file_path(storage_id) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Get the full file path for a storage id.
    ///
    /// The path is `{base_path}/{shard}/{storage_id}` where the shard is the
    /// first 2 characters of the id. Ids that could escape the base
    /// directory are rejected.
    fn file_path(&self, storage_id: &str) -> Result<PathBuf> {
        validate_storage_id(storage_id)?;
        let shard: String = storage_id.chars().take(2).collect();
        Ok(self.base_path.join(shard).join(storage_id))
    }
}

fn validate_storage_id(storage_id: &str) -> Result<()> {
    if storage_id.is_empty()
        || storage_id.contains('/')
        || storage_id.contains('\\')
        || storage_id.contains("..")
        || storage_id.chars().any(|c| c.is_control())
    {
        return Err(AcademiaError::Validation(format!(
            "invalid storage id: {storage_id:?}"
        )));
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<ObjectRef> {
        let (stem, ext) = split_file_name(suggested_name);
        let storage_id = format!("{}-{stem}.{ext}", Uuid::new_v4());
        let path = self.file_path(&storage_id)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        debug!(storage_id = %storage_id, size = bytes.len(), "Stored object");

        Ok(ObjectRef {
            url: self.url_for(&storage_id),
            storage_id,
        })
    }

    async fn get(&self, storage_id: &str) -> Result<Vec<u8>> {
        let path = self.file_path(storage_id)?;

        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AcademiaError::NotFound(format!("object {storage_id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, storage_id: &str) -> Result<bool> {
        let path = self.file_path(storage_id)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(storage_id = %storage_id, "Deleted object");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn storage_id_from_url(&self, url: &str) -> Option<String> {
        // Absolute URLs and bare paths are both accepted
        let path = match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url.split(['?', '#']).next().unwrap_or("").to_string(),
        };

        let (_, encoded) = path.rsplit_once(FILES_ROUTE_PREFIX)?;
        let decoded = urlencoding::decode(encoded).ok()?.into_owned();
        validate_storage_id(&decoded).ok()?;
        Some(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (LocalObjectStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp_dir.path().join("files"), "http://localhost:5000/")
            .unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, _temp) = create_store();

        let object = store.put(b"%PDF-1.4 data", "exam.pdf").await.unwrap();
        assert!(object.storage_id.ends_with("-exam.pdf"));
        assert_eq!(
            object.url,
            format!("http://localhost:5000/files/{}", object.storage_id)
        );

        let content = store.get(&object.storage_id).await.unwrap();
        assert_eq!(content, b"%PDF-1.4 data");
    }

    #[tokio::test]
    async fn test_sharding() {
        let (store, _temp) = create_store();

        let object = store.put(b"x", "a.pdf").await.unwrap();
        let shard = &object.storage_id[..2];
        let expected = store.base_path().join(shard).join(&object.storage_id);
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_url_is_percent_encoded() {
        let (store, _temp) = create_store();

        let object = store.put(b"x", "Midterm 2023.pdf").await.unwrap();
        assert!(object.storage_id.ends_with("-Midterm 2023.pdf"));
        assert!(object.url.ends_with("-Midterm%202023.pdf"));
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _temp) = create_store();

        let object = store.put(b"x", "a.pdf").await.unwrap();
        assert!(store.exists(&object.storage_id).await);

        assert!(store.delete(&object.storage_id).await.unwrap());
        assert!(!store.exists(&object.storage_id).await);
        assert!(!store.delete(&object.storage_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (store, _temp) = create_store();

        let result = store.get("ffffffff-missing.pdf").await;
        assert!(matches!(result, Err(AcademiaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let (store, _temp) = create_store();

        assert!(matches!(
            store.get("../secret").await,
            Err(AcademiaError::Validation(_))
        ));
        assert!(matches!(
            store.delete("a/b.pdf").await,
            Err(AcademiaError::Validation(_))
        ));
        assert!(matches!(
            store.get("").await,
            Err(AcademiaError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_id_from_url_round_trip() {
        let (store, _temp) = create_store();

        let object = store.put(b"x", "Final (v2) exam.pdf").await.unwrap();
        assert_eq!(
            store.storage_id_from_url(&object.url),
            Some(object.storage_id)
        );
    }

    #[test]
    fn test_storage_id_from_url_decodes() {
        let (store, _temp) = create_store();

        assert_eq!(
            store.storage_id_from_url("http://host/files/abc-Midterm%202023.pdf"),
            Some("abc-Midterm 2023.pdf".to_string())
        );
        assert_eq!(
            store.storage_id_from_url("/files/abc-notes.pdf?download=1"),
            Some("abc-notes.pdf".to_string())
        );
    }

    #[test]
    fn test_storage_id_from_url_rejects() {
        let (store, _temp) = create_store();

        assert_eq!(store.storage_id_from_url("http://host/other/a.pdf"), None);
        assert_eq!(store.storage_id_from_url("http://host/files/"), None);
        assert_eq!(
            store.storage_id_from_url("http://host/files/..%2Fsecret"),
            None
        );
    }
}
