//! Resource repository for Academia.

use sqlx::{QueryBuilder, SqlitePool};

use super::types::{NewResource, Resource, ResourceUpdate};
use crate::Result;

const RESOURCE_COLUMNS: &str =
    "id, title, year, subject_code, exam_type, file_url, storage_id, created_at";

/// Repository for resource metadata records.
pub struct ResourceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ResourceRepository<'a> {
    /// Create a new ResourceRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new resource record and return its ID.
    ///
    /// Only the write happens here; callers read the row back with
    /// [`get_by_id`](Self::get_by_id), so an error always means nothing was
    /// inserted.
    pub async fn insert(&self, resource: &NewResource) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO resources (title, year, subject_code, exam_type, file_url, storage_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&resource.title)
        .bind(resource.year)
        .bind(&resource.subject_code)
        .bind(&resource.exam_type)
        .bind(&resource.file_url)
        .bind(&resource.storage_id)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get a resource by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Resource>> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(resource)
    }

    /// List all resources, newest first.
    pub async fn list(&self) -> Result<Vec<Resource>> {
        let resources = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(resources)
    }

    /// Update a resource by ID.
    ///
    /// Only fields that are set in the update will be modified. Returns
    /// false if no row has this ID. Like [`insert`](Self::insert) this is
    /// write-only.
    pub async fn update(&self, id: i64, update: &ResourceUpdate) -> Result<bool> {
        if update.is_empty() {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM resources WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
            return Ok(exists.is_some());
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE resources SET ");
        let mut separated = query.separated(", ");

        if let Some(ref title) = update.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }
        if let Some(year) = update.year {
            separated.push("year = ");
            separated.push_bind_unseparated(year);
        }
        if let Some(ref subject_code) = update.subject_code {
            separated.push("subject_code = ");
            separated.push_bind_unseparated(subject_code);
        }
        if let Some(ref exam_type) = update.exam_type {
            separated.push("exam_type = ");
            separated.push_bind_unseparated(exam_type);
        }
        if let Some(ref object) = update.object {
            separated.push("file_url = ");
            separated.push_bind_unseparated(&object.url);
            separated.push("storage_id = ");
            separated.push_bind_unseparated(&object.storage_id);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query.build().execute(self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a resource by ID.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all resources.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resources")
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }
}
