//! Resource record types.

use crate::storage::ObjectRef;

/// A shared academic document and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Resource {
    /// Unique resource ID.
    pub id: i64,
    /// Document title.
    pub title: String,
    /// Exam or publication year.
    pub year: i64,
    /// Course/subject code (e.g. "CS101").
    pub subject_code: String,
    /// Exam type (e.g. "Midterm").
    pub exam_type: String,
    /// Fully-qualified retrieval URL of the stored file.
    pub file_url: String,
    /// Object store identifier; None only for legacy rows.
    pub storage_id: Option<String>,
    /// Creation timestamp (SQLite datetime, UTC).
    pub created_at: String,
}

/// Data for inserting a new resource.
#[derive(Debug, Clone)]
pub struct NewResource {
    /// Document title.
    pub title: String,
    /// Exam or publication year.
    pub year: i64,
    /// Course/subject code.
    pub subject_code: String,
    /// Exam type.
    pub exam_type: String,
    /// Retrieval URL.
    pub file_url: String,
    /// Object store identifier.
    pub storage_id: Option<String>,
}

impl NewResource {
    /// Build a record from validated metadata and the stored object.
    pub fn from_draft(draft: ResourceDraft, object: &ObjectRef) -> Self {
        Self {
            title: draft.title,
            year: draft.year,
            subject_code: draft.subject_code,
            exam_type: draft.exam_type,
            file_url: object.url.clone(),
            storage_id: Some(object.storage_id.clone()),
        }
    }
}

/// Partial update of a resource. Unset fields keep their values.
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdate {
    /// New title.
    pub title: Option<String>,
    /// New year.
    pub year: Option<i64>,
    /// New subject code.
    pub subject_code: Option<String>,
    /// New exam type.
    pub exam_type: Option<String>,
    /// New stored object (updates both URL and storage id).
    pub object: Option<ObjectRef>,
}

impl ResourceUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an update from metadata changes.
    pub fn from_changes(changes: ResourceChanges) -> Self {
        Self {
            title: changes.title,
            year: changes.year,
            subject_code: changes.subject_code,
            exam_type: changes.exam_type,
            object: None,
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the year.
    pub fn year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    /// Point the record at a new stored object.
    pub fn object(mut self, object: ObjectRef) -> Self {
        self.object = Some(object);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.year.is_none()
            && self.subject_code.is_none()
            && self.exam_type.is_none()
            && self.object.is_none()
    }
}

/// Validated metadata for a new resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDraft {
    /// Document title.
    pub title: String,
    /// Exam or publication year.
    pub year: i64,
    /// Course/subject code.
    pub subject_code: String,
    /// Exam type.
    pub exam_type: String,
}

/// Validated metadata changes for an existing resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceChanges {
    /// New title.
    pub title: Option<String>,
    /// New year.
    pub year: Option<i64>,
    /// New subject code.
    pub subject_code: Option<String>,
    /// New exam type.
    pub exam_type: Option<String>,
}
