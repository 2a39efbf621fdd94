//! Upload validation for resource files and metadata fields.
//!
//! Everything here runs before any database or object store call, so a
//! rejected request never leaves partial state behind.

use std::path::Path;

use super::types::{ResourceChanges, ResourceDraft};
use crate::{AcademiaError, Result};

/// Content types accepted for uploaded documents.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["application/pdf", "application/octet-stream"];

/// Largest accepted year.
pub const MAX_YEAR: i64 = 9999;

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Client-supplied file name.
    pub file_name: String,
    /// Client-supplied content type, if any.
    pub content_type: Option<String>,
    /// File content.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Create a new upload.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check the file against the upload rules.
    ///
    /// - Extension must be `pdf` (case-insensitive)
    /// - Content type, when present, must be PDF or generic binary
    /// - Content must be non-empty and at most `max_size` bytes
    pub fn validate(&self, max_size: u64) -> Result<()> {
        let is_pdf = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(AcademiaError::Validation(
                "Only PDF files are allowed".to_string(),
            ));
        }

        if let Some(content_type) = self.content_type.as_deref() {
            // Ignore parameters such as "; charset=binary"
            let essence = content_type
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();
            if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
                return Err(AcademiaError::Validation(format!(
                    "Unsupported content type: {content_type}"
                )));
            }
        }

        if self.bytes.is_empty() {
            return Err(AcademiaError::Validation("File is empty".to_string()));
        }

        if self.size() > max_size {
            let max_mb = max_size / 1024 / 1024;
            return Err(AcademiaError::Validation(format!(
                "File too large (max {max_mb}MB)"
            )));
        }

        Ok(())
    }
}

/// Parse a year field.
pub fn parse_year(value: &str) -> Result<i64> {
    let year: i64 = value
        .trim()
        .parse()
        .map_err(|_| AcademiaError::Validation(format!("Invalid year: {value}")))?;
    if !(1..=MAX_YEAR).contains(&year) {
        return Err(AcademiaError::Validation(format!("Invalid year: {value}")));
    }
    Ok(year)
}

/// Raw metadata fields collected from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct ResourceFields {
    /// `title` field.
    pub title: Option<String>,
    /// `year` field.
    pub year: Option<String>,
    /// `subjectCode` field.
    pub subject_code: Option<String>,
    /// `examType` field.
    pub exam_type: Option<String>,
}

impl ResourceFields {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a form field. Returns false for names that are not metadata.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "year" => &mut self.year,
            "subjectCode" => &mut self.subject_code,
            "examType" => &mut self.exam_type,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Validate fields for a new resource. Every field is required.
    pub fn into_draft(self) -> Result<ResourceDraft> {
        let title = non_empty(self.title);
        let year = non_empty(self.year);
        let subject_code = non_empty(self.subject_code);
        let exam_type = non_empty(self.exam_type);

        let missing: Vec<&str> = [
            ("title", title.is_none()),
            ("year", year.is_none()),
            ("subjectCode", subject_code.is_none()),
            ("examType", exam_type.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (title, year, subject_code, exam_type) {
            (Some(title), Some(year), Some(subject_code), Some(exam_type)) => Ok(ResourceDraft {
                title,
                year: parse_year(&year)?,
                subject_code,
                exam_type,
            }),
            _ => Err(AcademiaError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Validate fields for a partial update. Omitted or empty fields are left unchanged.
    pub fn into_changes(self) -> Result<ResourceChanges> {
        let year = match non_empty(self.year) {
            Some(year) => Some(parse_year(&year)?),
            None => None,
        };

        Ok(ResourceChanges {
            title: non_empty(self.title),
            year,
            subject_code: non_empty(self.subject_code),
            exam_type: non_empty(self.exam_type),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
