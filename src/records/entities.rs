//! Entity schemas
//!
//! Typed fields for each entity class. Payload fields outside these schemas
//! are carried through untouched in [`RecordMeta::extra`].

use serde::{Deserialize, Serialize};

use super::flex::{opt_string, opt_u32, Ident};
use super::{Entity, EntityKind, RecordMeta};

/// Enrollment status written when a student is deactivated
pub const STATUS_WITHDRAWN: &str = "WITHDRAWN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub student_id: Option<Ident>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default, deserialize_with = "opt_u32")]
    pub year_of_study: Option<u32>,
    #[serde(default)]
    pub enrollment_date: Option<String>,
    #[serde(default)]
    pub enrollment_status: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Entity for Student {
    const KIND: EntityKind = EntityKind::Student;

    fn id(&self) -> Option<&Ident> {
        self.student_id.as_ref()
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn on_deactivate(&mut self) {
        self.enrollment_status = Some(STATUS_WITHDRAWN.to_string());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecturer {
    #[serde(default)]
    pub lecturer_id: Option<Ident>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Entity for Lecturer {
    const KIND: EntityKind = EntityKind::Lecturer;

    fn id(&self) -> Option<&Ident> {
        self.lecturer_id.as_ref()
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default)]
    pub course_id: Option<Ident>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub credits: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub assigned_lecturer_id: Option<Ident>,
    #[serde(default)]
    pub lecturer_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Entity for Course {
    const KIND: EntityKind = EntityKind::Course;

    fn id(&self) -> Option<&Ident> {
        self.course_id.as_ref()
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(default)]
    pub enrollment_id: Option<Ident>,
    #[serde(default)]
    pub student_id: Option<Ident>,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_number: Option<Ident>,
    #[serde(default)]
    pub course_id: Option<Ident>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub lecturer_id: Option<Ident>,
    #[serde(default)]
    pub lecturer_name: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Entity for Enrollment {
    const KIND: EntityKind = EntityKind::Enrollment;

    fn id(&self) -> Option<&Ident> {
        self.enrollment_id.as_ref()
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    #[serde(default)]
    pub transcript_id: Option<Ident>,
    #[serde(default)]
    pub student_id: Option<Ident>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub gpa: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub total_credits: Option<String>,
    #[serde(default)]
    pub result_ids: Vec<Ident>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Entity for Transcript {
    const KIND: EntityKind = EntityKind::Transcript;

    fn id(&self) -> Option<&Ident> {
        self.transcript_id.as_ref()
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
