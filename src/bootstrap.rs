//! Bootstrap Seeder
//!
//! Writes an initial snapshot into an empty ledger: one aggregate document
//! per entity class under the reserved collection keys (`Students`,
//! `Grades`, ...) plus one row per entity in its namespace.
//!
//! The aggregate documents are written here and nowhere else. Later
//! per-entity mutations do not touch them, so they describe the ledger as
//! seeded, not as it is now.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::grades::{self, GradeResult};
use crate::integrity;
use crate::ledger::Transaction;
use crate::records::{store, Course, Enrollment, Entity, EntityKind, Lecturer, Student, Transcript};

const BUILTIN_SEED: &str = include_str!("../fixtures/seed.json");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedSnapshot {
    #[serde(default)]
    pub students: Vec<Value>,
    #[serde(default)]
    pub lecturers: Vec<Value>,
    #[serde(default)]
    pub courses: Vec<Value>,
    #[serde(default)]
    pub enrollments: Vec<Value>,
    #[serde(default)]
    pub grades: Vec<Value>,
    #[serde(default)]
    pub transcripts: Vec<Value>,
}

impl SeedSnapshot {
    /// Snapshot shipped with the crate
    pub fn builtin() -> Result<Self> {
        Ok(serde_json::from_str(BUILTIN_SEED)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("Failed to read seed file {:?}: {}", path, e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| LedgerError::Config(format!("Failed to parse seed file {:?}: {}", path, e)))
    }

    fn collection(&self, kind: EntityKind) -> &[Value] {
        match kind {
            EntityKind::Student => &self.students,
            EntityKind::Lecturer => &self.lecturers,
            EntityKind::Course => &self.courses,
            EntityKind::Enrollment => &self.enrollments,
            EntityKind::Result => &self.grades,
            EntityKind::Transcript => &self.transcripts,
        }
    }
}

/// Rows written per entity class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub students: usize,
    pub lecturers: usize,
    pub courses: usize,
    pub enrollments: usize,
    pub grades: usize,
    pub transcripts: usize,
}

fn typed<T: Entity>(kind: EntityKind, index: usize, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| LedgerError::Parse(format!("seed {} #{}: {}", kind, index, e)))
}

async fn create_all<T: Entity>(tx: &mut Transaction, snapshot: &SeedSnapshot) -> Result<usize> {
    let rows = snapshot.collection(T::KIND);
    for (i, value) in rows.iter().enumerate() {
        let entity: T = typed(T::KIND, i, value)?;
        store::create(tx, entity).await?;
    }
    Ok(rows.len())
}

/// Seed an empty ledger. Fails `DuplicateKey` if it was already seeded.
pub async fn init_ledger(tx: &mut Transaction, snapshot: &SeedSnapshot) -> Result<SeedSummary> {
    let marker = EntityKind::Student.collection_key();
    if tx.get_state(marker).await?.is_some() {
        return Err(LedgerError::DuplicateKey(marker.to_string()));
    }

    for kind in EntityKind::ALL {
        let document = integrity::canonical_bytes(&snapshot.collection(kind))?;
        tx.put_state(kind.collection_key(), document);
    }

    let mut summary = SeedSummary {
        students: create_all::<Student>(tx, snapshot).await?,
        lecturers: create_all::<Lecturer>(tx, snapshot).await?,
        courses: create_all::<Course>(tx, snapshot).await?,
        enrollments: create_all::<Enrollment>(tx, snapshot).await?,
        transcripts: create_all::<Transcript>(tx, snapshot).await?,
        ..Default::default()
    };

    for (i, value) in snapshot.grades.iter().enumerate() {
        let payload = value
            .as_object()
            .cloned()
            .ok_or_else(|| LedgerError::Parse(format!("seed {} #{}: not an object", EntityKind::Result, i)))?;
        grades::submit_grade(tx, GradeResult::from_submission(payload)?, false).await?;
        summary.grades += 1;
    }

    info!(
        "Ledger initialized: {} students, {} lecturers, {} courses, {} enrollments, {} grades, {} transcripts",
        summary.students,
        summary.lecturers,
        summary.courses,
        summary.enrollments,
        summary.grades,
        summary.transcripts
    );
    Ok(summary)
}
