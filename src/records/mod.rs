//! Academic Record Store
//!
//! Type-tagged entity records over the ledger key space. Every entity lives
//! under a namespaced key `"<type>:<id>"`, so identifiers of different
//! entity classes never collide.

pub mod entities;
pub mod flex;
pub mod scanner;
pub mod store;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LedgerError, Result};

pub use entities::{Course, Enrollment, Lecturer, Student, Transcript};
pub use flex::Ident;
pub use scanner::{ScanOutcome, SkippedRecord};

/// Separator between namespace and identifier in storage keys
pub const KEY_SEPARATOR: char = ':';

/// Type discriminator stored in every record's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Student,
    Lecturer,
    Course,
    Enrollment,
    Result,
    Transcript,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Student,
        EntityKind::Lecturer,
        EntityKind::Course,
        EntityKind::Enrollment,
        EntityKind::Result,
        EntityKind::Transcript,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::Lecturer => "lecturer",
            EntityKind::Course => "course",
            EntityKind::Enrollment => "enrollment",
            EntityKind::Result => "result",
            EntityKind::Transcript => "transcript",
        }
    }

    /// Payload field carrying the business identifier
    pub fn key_field(&self) -> &'static str {
        match self {
            EntityKind::Student => "studentId",
            EntityKind::Lecturer => "lecturerId",
            EntityKind::Course => "courseId",
            EntityKind::Enrollment => "enrollmentId",
            EntityKind::Result => "resultId",
            EntityKind::Transcript => "transcriptId",
        }
    }

    /// Reserved key of the bootstrap snapshot for this kind
    pub fn collection_key(&self) -> &'static str {
        match self {
            EntityKind::Student => "Students",
            EntityKind::Lecturer => "Lecturers",
            EntityKind::Course => "Courses",
            EntityKind::Enrollment => "Enrollments",
            EntityKind::Result => "Grades",
            EntityKind::Transcript => "Transcripts",
        }
    }

    pub fn namespace(&self) -> String {
        format!("{}{}", self.as_str(), KEY_SEPARATOR)
    }

    /// Storage key for `id` within this kind's namespace.
    pub fn storage_key(&self, id: &str) -> Result<String> {
        validate_id(id)?;
        Ok(format!("{}{}{}", self.as_str(), KEY_SEPARATOR, id))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject identifiers that would break the key layout.
pub fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(LedgerError::InvalidKey("identifier is empty".to_string()));
    }
    if id.contains(KEY_SEPARATOR) {
        return Err(LedgerError::InvalidKey(format!(
            "identifier {:?} contains reserved separator '{}'",
            id, KEY_SEPARATOR
        )));
    }
    Ok(())
}

/// Fields shared by every entity record, plus any payload fields the typed
/// schema does not name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub updated_date: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A typed record stored in its own namespace
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;

    /// Business identifier from the key field, if the payload carried one.
    fn id(&self) -> Option<&Ident>;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Domain-specific terminal status applied on soft delete.
    fn on_deactivate(&mut self) {}

    /// Identifier, or `MissingKey` naming the expected field.
    fn require_id(&self) -> Result<String> {
        self.id()
            .map(|id| id.to_string())
            .ok_or_else(|| LedgerError::MissingKey(Self::KIND.key_field().to_string()))
    }
}

/// Acknowledgement returned by mutating operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub message: String,
    pub key: String,
}

impl Receipt {
    pub fn new(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_namespaced() {
        assert_eq!(EntityKind::Student.storage_key("102").unwrap(), "student:102");
        assert_eq!(EntityKind::Result.storage_key("102").unwrap(), "result:102");
        assert_ne!(
            EntityKind::Student.storage_key("102").unwrap(),
            EntityKind::Result.storage_key("102").unwrap()
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(matches!(validate_id(""), Err(LedgerError::InvalidKey(_))));
        assert!(matches!(validate_id("  "), Err(LedgerError::InvalidKey(_))));
        assert!(matches!(validate_id("a:b"), Err(LedgerError::InvalidKey(_))));
        assert!(validate_id("Rerum temporibus qui").is_ok());
    }

    #[test]
    fn test_collection_keys_outside_namespaces() {
        for kind in EntityKind::ALL {
            assert!(!kind.collection_key().contains(KEY_SEPARATOR));
        }
    }
}
