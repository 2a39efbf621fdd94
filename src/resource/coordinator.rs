//! Resource lifecycle coordination.
//!
//! A resource is a database record plus one object in the object store. The
//! two stores share no transaction, so every write runs in an order that
//! keeps the record pointing at a live object and undoes its own upload when
//! the database step fails:
//!
//! - create: upload, then insert; on insert failure delete the upload
//! - replace: upload, then update, then delete the old object
//! - delete: delete the object (best effort), then the record

use tracing::{debug, error, info, warn};

use super::repository::ResourceRepository;
use super::types::{NewResource, Resource, ResourceChanges, ResourceDraft, ResourceUpdate};
use super::upload::FileUpload;
use super::DEFAULT_MAX_UPLOAD_SIZE;
use crate::db::Database;
use crate::storage::{ObjectRef, ObjectStore};
use crate::{AcademiaError, Result};

fn not_found() -> AcademiaError {
    AcademiaError::NotFound("resource".to_string())
}

fn storage_error(err: AcademiaError) -> AcademiaError {
    match err {
        AcademiaError::Storage(_) => err,
        other => AcademiaError::Storage(other.to_string()),
    }
}

/// Keeps resource records and stored objects consistent.
pub struct ResourceCoordinator<'a> {
    db: &'a Database,
    store: &'a dyn ObjectStore,
    max_upload_size: u64,
}

impl<'a> ResourceCoordinator<'a> {
    /// Create a new coordinator.
    pub fn new(db: &'a Database, store: &'a dyn ObjectStore) -> Self {
        Self {
            db,
            store,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Set the maximum accepted file size in bytes.
    pub fn with_max_upload_size(mut self, max_size: u64) -> Self {
        self.max_upload_size = max_size;
        self
    }

    fn repo(&self) -> ResourceRepository<'_> {
        ResourceRepository::new(self.db.pool())
    }

    /// List all resources, newest first.
    pub async fn list(&self) -> Result<Vec<Resource>> {
        self.repo().list().await
    }

    /// Get a resource by ID.
    pub async fn get(&self, id: i64) -> Result<Resource> {
        self.repo().get_by_id(id).await?.ok_or_else(not_found)
    }

    /// Create a resource from validated metadata and an uploaded file.
    ///
    /// # Errors
    /// - `Validation` if the file is rejected (nothing is stored)
    /// - `Storage` if the upload fails (no record is created)
    /// - `Database` if the insert fails (the upload is deleted again)
    pub async fn create(&self, draft: ResourceDraft, file: FileUpload) -> Result<Resource> {
        file.validate(self.max_upload_size)?;

        let object = self
            .store
            .put(&file.bytes, &file.file_name)
            .await
            .map_err(storage_error)?;
        debug!(
            storage_id = %object.storage_id,
            backend = self.store.name(),
            size = file.size(),
            "Uploaded resource file"
        );

        let new_resource = NewResource::from_draft(draft, &object);
        let id = match self.repo().insert(&new_resource).await {
            Ok(id) => id,
            Err(e) => {
                warn!(storage_id = %object.storage_id, error = %e, "Resource insert failed");
                self.discard(&object).await;
                return Err(e);
            }
        };
        info!(
            resource_id = id,
            storage_id = %object.storage_id,
            "Resource created"
        );

        // The record is committed; a failed read-back must not touch the object
        self.get(id).await
    }

    /// Update a resource's metadata and optionally replace its file.
    ///
    /// Without a file the object store is not touched. With a file the new
    /// object is uploaded and the record switched to it before the old
    /// object is removed; a failed removal only logs a warning.
    pub async fn replace(
        &self,
        id: i64,
        changes: ResourceChanges,
        file: Option<FileUpload>,
    ) -> Result<Resource> {
        if let Some(ref file) = file {
            file.validate(self.max_upload_size)?;
        }

        let current = self.get(id).await?;

        let new_object = match file {
            Some(file) => {
                let object = self
                    .store
                    .put(&file.bytes, &file.file_name)
                    .await
                    .map_err(storage_error)?;
                debug!(
                    resource_id = id,
                    storage_id = %object.storage_id,
                    "Uploaded replacement file"
                );
                Some(object)
            }
            None => None,
        };

        let mut update = ResourceUpdate::from_changes(changes);
        update.object = new_object.clone();

        match self.repo().update(id, &update).await {
            Ok(true) => {}
            Ok(false) => {
                // Deleted between fetch and update
                if let Some(ref object) = new_object {
                    self.discard(object).await;
                }
                return Err(not_found());
            }
            Err(e) => {
                warn!(resource_id = id, error = %e, "Resource update failed");
                if let Some(ref object) = new_object {
                    self.discard(object).await;
                }
                return Err(e);
            }
        }

        if let Some(ref object) = new_object {
            match self.storage_id_of(&current) {
                Some(old_id) if old_id != object.storage_id => {
                    self.remove_object(id, &old_id).await;
                }
                Some(_) => {}
                None => warn!(
                    resource_id = id,
                    file_url = %current.file_url,
                    "Cannot determine storage id of replaced file; leaving it in place"
                ),
            }
        }

        info!(
            resource_id = id,
            file_replaced = new_object.is_some(),
            "Resource updated"
        );
        self.get(id).await
    }

    /// Delete a resource and its stored file.
    ///
    /// The object is removed first on a best-effort basis; the record is
    /// deleted regardless of the outcome.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let current = self.get(id).await?;

        match self.storage_id_of(&current) {
            Some(storage_id) => self.remove_object(id, &storage_id).await,
            None => warn!(
                resource_id = id,
                file_url = %current.file_url,
                "Cannot determine storage id; leaving stored file in place"
            ),
        }

        if !self.repo().delete(id).await? {
            debug!(resource_id = id, "Resource already removed");
        }

        info!(resource_id = id, "Resource deleted");
        Ok(())
    }

    /// Storage id of a resource's file.
    ///
    /// Uses the persisted id; only legacy rows without one fall back to
    /// parsing the retrieval URL.
    pub fn storage_id_of(&self, resource: &Resource) -> Option<String> {
        resource
            .storage_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| self.store.storage_id_from_url(&resource.file_url))
    }

    /// Compensating delete of an object whose record write failed.
    async fn discard(&self, object: &ObjectRef) {
        match self.store.delete(&object.storage_id).await {
            Ok(true) => info!(storage_id = %object.storage_id, "Removed uploaded object after failed write"),
            Ok(false) => warn!(storage_id = %object.storage_id, "Uploaded object already gone during cleanup"),
            Err(e) => error!(
                storage_id = %object.storage_id,
                url = %object.url,
                error = %e,
                "Orphaned object left in store; manual cleanup required"
            ),
        }
    }

    /// Best-effort removal of an object no longer referenced by its record.
    async fn remove_object(&self, resource_id: i64, storage_id: &str) {
        match self.store.delete(storage_id).await {
            Ok(true) => debug!(resource_id, storage_id = %storage_id, "Removed stored file"),
            Ok(false) => warn!(resource_id, storage_id = %storage_id, "Stored file was already gone"),
            Err(e) => warn!(
                resource_id,
                storage_id = %storage_id,
                error = %e,
                "Failed to remove stored file"
            ),
        }
    }
}
