//! Input-side value objects.

use serde::{Deserialize, Serialize};

/// Metadata guessed from a document's file name.
///
/// Best-effort only: the model's own `document_metadata` wins when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHints {
    /// e.g. "Approved SOL Standards", "Instructional Guide"
    pub document_type: Option<String>,

    /// Leading sequence number in the file name
    pub number: Option<u32>,

    /// "Grade 3", "Algebra 1", ...
    pub grade_level: Option<String>,

    pub course_name: Option<String>,

    pub year: Option<String>,
}

impl DocumentHints {
    pub fn is_empty(&self) -> bool {
        self.grade_level.is_none() && self.course_name.is_none() && self.year.is_none()
    }

    /// One-line rendering for the request preamble.
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(grade) = &self.grade_level {
            parts.push(format!("grade_level={grade}"));
        }
        if let Some(course) = &self.course_name {
            parts.push(format!("course_name={course}"));
        }
        if let Some(year) = &self.year {
            parts.push(format!("year={year}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Plain text of one curriculum document plus its stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// File name (or path) the text came from
    pub identifier: String,

    /// UTF-8 text; may be empty, validation will then fail downstream
    pub text: String,

    #[serde(default)]
    pub hints: DocumentHints,
}

impl SourceDocument {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
            hints: DocumentHints::default(),
        }
    }

    pub fn with_hints(mut self, hints: DocumentHints) -> Self {
        self.hints = hints;
        self
    }

    /// File name without directories.
    pub fn file_name(&self) -> &str {
        self.identifier
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.identifier)
    }

    /// File name without directories or extension.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }
}
