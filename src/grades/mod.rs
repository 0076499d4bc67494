//! Grade Results
//!
//! A grade result is submitted PENDING with a digest over its signed
//! payload, and moves once to OFFICIAL when that digest still recomputes.

pub mod machine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{LedgerError, Result};
use crate::integrity;
use crate::records::flex::{opt_string, Ident};
use crate::records::{Entity, EntityKind, RecordMeta};

pub use machine::{audit_results, get_result, list_results, submit_grade, verify, IntegrityReport, UnverifiedResult};

const SIGNED_PAYLOAD_DOMAIN: &str = "grade-result";

/// Fields owned by the state machine. Submitted values are discarded.
const LIFECYCLE_FIELDS: [&str; 3] = ["status", "verifiedAt", "hash"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeStatus {
    #[default]
    Pending,
    Official,
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeStatus::Pending => f.write_str("PENDING"),
            GradeStatus::Official => f.write_str("OFFICIAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeType {
    Numeric,
    Letter,
    PassFail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    #[serde(default)]
    pub result_id: Option<Ident>,
    #[serde(default)]
    pub enrollment_id: Option<Ident>,
    #[serde(default)]
    pub student_number: Option<Ident>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub grade_type: Option<GradeType>,
    #[serde(default, deserialize_with = "opt_string")]
    pub numeric_grade: Option<String>,
    #[serde(default)]
    pub letter_grade: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub course_work_grade: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub exam_grade: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub submitted_by_id: Option<Ident>,
    #[serde(default)]
    pub lecturer_name: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: GradeStatus,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

/// The fixed field subset a grade digest covers. Lifecycle fields (`status`,
/// `verifiedAt`), the digest itself and bookkeeping fields are excluded, so
/// the digest at submission and at verification agree unless a signed value
/// changed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayload<'a> {
    pub result_id: Option<&'a Ident>,
    pub enrollment_id: Option<&'a Ident>,
    pub student_number: Option<&'a Ident>,
    pub course_code: Option<&'a str>,
    pub semester: Option<&'a str>,
    pub academic_year: Option<&'a str>,
    pub grade_type: Option<GradeType>,
    pub numeric_grade: Option<&'a str>,
    pub letter_grade: Option<&'a str>,
    pub course_work_grade: Option<&'a str>,
    pub exam_grade: Option<&'a str>,
    pub remarks: Option<&'a str>,
    pub submitted_by_id: Option<&'a Ident>,
    pub lecturer_name: Option<&'a str>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl GradeResult {
    /// Build a result from a submission payload. Lifecycle fields are
    /// dropped before parsing, since submission sets them itself.
    pub fn from_submission(mut payload: Map<String, Value>) -> Result<Self> {
        for field in LIFECYCLE_FIELDS {
            payload.remove(field);
        }
        serde_json::from_value(Value::Object(payload))
            .map_err(|e| LedgerError::Validation(format!("grade submission rejected: {}", e)))
    }

    pub fn signed_payload(&self) -> SignedPayload<'_> {
        SignedPayload {
            result_id: self.result_id.as_ref(),
            enrollment_id: self.enrollment_id.as_ref(),
            student_number: self.student_number.as_ref(),
            course_code: self.course_code.as_deref(),
            semester: self.semester.as_deref(),
            academic_year: self.academic_year.as_deref(),
            grade_type: self.grade_type,
            numeric_grade: self.numeric_grade.as_deref(),
            letter_grade: self.letter_grade.as_deref(),
            course_work_grade: self.course_work_grade.as_deref(),
            exam_grade: self.exam_grade.as_deref(),
            remarks: self.remarks.as_deref(),
            submitted_by_id: self.submitted_by_id.as_ref(),
            lecturer_name: self.lecturer_name.as_deref(),
            submitted_at: self.submitted_at,
        }
    }

    /// Digest of the signed payload.
    pub fn compute_hash(&self) -> Result<String> {
        integrity::digest(SIGNED_PAYLOAD_DOMAIN, &self.signed_payload())
    }

    pub fn is_official(&self) -> bool {
        self.status == GradeStatus::Official
    }
}

impl Entity for GradeResult {
    const KIND: EntityKind = EntityKind::Result;

    /// Results are keyed by `resultId`, or by their enrollment when the
    /// payload names no separate result id.
    fn id(&self) -> Option<&Ident> {
        self.result_id.as_ref().or(self.enrollment_id.as_ref())
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// Acknowledgement for grade operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReceipt {
    pub message: String,
    pub result_id: String,
}
