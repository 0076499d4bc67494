//! Records contract
//!
//! The operation surface of the ledger. Every call runs in its own
//! transaction on behalf of a performer; mutating calls commit, reads are
//! dropped without writing.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::audit::{self, AuditEntry};
use crate::bootstrap::{self, SeedSnapshot, SeedSummary};
use crate::error::Result;
use crate::grades::{self, GradeReceipt, GradeResult, IntegrityReport};
use crate::ledger::{LedgerStore, Transaction};
use crate::records::scanner::{self, ScanOutcome};
use crate::records::{store, Course, Enrollment, Entity, EntityKind, Lecturer, Receipt, Student, Transcript};

#[derive(Clone)]
pub struct RecordsContract {
    store: Arc<dyn LedgerStore>,
    record_submissions: bool,
}

impl RecordsContract {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            record_submissions: false,
        }
    }

    /// Also audit grade submissions (CREATE entries), not only verifications.
    pub fn with_submission_audit(mut self, enabled: bool) -> Self {
        self.record_submissions = enabled;
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    fn begin(&self, performer: &str) -> Transaction {
        let tx = Transaction::begin(self.store.clone(), performer);
        debug!("Transaction {} started for {}", tx.tx_id(), performer);
        tx
    }

    async fn create<T: Entity>(&self, performer: &str, entity: T) -> Result<Receipt> {
        let mut tx = self.begin(performer);
        let receipt = store::create(&mut tx, entity).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    async fn get<T: Entity>(&self, performer: &str, id: &str) -> Result<T> {
        let mut tx = self.begin(performer);
        store::get(&mut tx, id).await
    }

    async fn list<T: Entity>(&self, performer: &str) -> Result<ScanOutcome<T>> {
        let tx = self.begin(performer);
        scanner::scan(&tx).await
    }

    async fn deactivate<T: Entity>(&self, performer: &str, id: &str) -> Result<Receipt> {
        let mut tx = self.begin(performer);
        let receipt = store::deactivate::<T>(&mut tx, id).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    // Students

    pub async fn create_student(&self, performer: &str, student: Student) -> Result<Receipt> {
        self.create(performer, student).await
    }

    pub async fn get_student(&self, performer: &str, student_id: &str) -> Result<Student> {
        self.get(performer, student_id).await
    }

    pub async fn list_students(&self, performer: &str) -> Result<ScanOutcome<Student>> {
        self.list(performer).await
    }

    pub async fn update_student(
        &self,
        performer: &str,
        student_id: &str,
        patch: Map<String, Value>,
    ) -> Result<Receipt> {
        let mut tx = self.begin(performer);
        let receipt = store::update::<Student>(&mut tx, student_id, patch).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    pub async fn deactivate_student(&self, performer: &str, student_id: &str) -> Result<Receipt> {
        self.deactivate::<Student>(performer, student_id).await
    }

    // Lecturers

    pub async fn create_lecturer(&self, performer: &str, lecturer: Lecturer) -> Result<Receipt> {
        self.create(performer, lecturer).await
    }

    pub async fn get_lecturer(&self, performer: &str, lecturer_id: &str) -> Result<Lecturer> {
        self.get(performer, lecturer_id).await
    }

    pub async fn list_lecturers(&self, performer: &str) -> Result<ScanOutcome<Lecturer>> {
        self.list(performer).await
    }

    pub async fn deactivate_lecturer(&self, performer: &str, lecturer_id: &str) -> Result<Receipt> {
        self.deactivate::<Lecturer>(performer, lecturer_id).await
    }

    // Courses and enrollments

    pub async fn create_course(&self, performer: &str, course: Course) -> Result<Receipt> {
        self.create(performer, course).await
    }

    pub async fn get_course(&self, performer: &str, course_id: &str) -> Result<Course> {
        self.get(performer, course_id).await
    }

    pub async fn list_courses(&self, performer: &str) -> Result<ScanOutcome<Course>> {
        self.list(performer).await
    }

    pub async fn create_enrollment(&self, performer: &str, enrollment: Enrollment) -> Result<Receipt> {
        self.create(performer, enrollment).await
    }

    pub async fn get_enrollment(&self, performer: &str, enrollment_id: &str) -> Result<Enrollment> {
        self.get(performer, enrollment_id).await
    }

    pub async fn list_enrollments(&self, performer: &str) -> Result<ScanOutcome<Enrollment>> {
        self.list(performer).await
    }

    // Grades

    pub async fn submit_grade(&self, performer: &str, result: GradeResult) -> Result<GradeReceipt> {
        let mut tx = self.begin(performer);
        let receipt = grades::submit_grade(&mut tx, result, self.record_submissions).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    pub async fn get_result(&self, performer: &str, result_id: &str) -> Result<GradeResult> {
        let mut tx = self.begin(performer);
        grades::get_result(&mut tx, result_id).await
    }

    pub async fn list_results(&self, performer: &str) -> Result<ScanOutcome<GradeResult>> {
        let tx = self.begin(performer);
        grades::list_results(&tx).await
    }

    pub async fn verify_grade(&self, performer: &str, result_id: &str) -> Result<GradeReceipt> {
        let mut tx = self.begin(performer);
        let receipt = grades::verify(&mut tx, result_id).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    /// Audit entries for one result, oldest first. Empty when the result
    /// has never been audited, including when it does not exist.
    pub async fn get_grade_audit_trail(
        &self,
        performer: &str,
        result_id: &str,
    ) -> Result<ScanOutcome<AuditEntry>> {
        let subject_key = EntityKind::Result.storage_key(result_id)?;
        let tx = self.begin(performer);
        audit::trail(&tx, &subject_key).await
    }

    /// Recompute every stored result digest. Writes nothing.
    pub async fn audit_results(&self, performer: &str) -> Result<IntegrityReport> {
        let tx = self.begin(performer);
        grades::audit_results(&tx).await
    }

    // Transcripts

    pub async fn generate_transcript(&self, performer: &str, transcript: Transcript) -> Result<Receipt> {
        self.create(performer, transcript).await
    }

    pub async fn list_transcripts(&self, performer: &str, student_id: &str) -> Result<ScanOutcome<Transcript>> {
        let tx = self.begin(performer);
        scanner::scan_filtered(&tx, |t: &Transcript| {
            t.student_id.as_ref().map(|id| id.as_str()) == Some(student_id)
        })
        .await
    }

    // Bootstrap

    pub async fn init_ledger(&self, performer: &str, snapshot: &SeedSnapshot) -> Result<SeedSummary> {
        let mut tx = self.begin(performer);
        let summary = bootstrap::init_ledger(&mut tx, snapshot).await?;
        tx.commit().await?;
        Ok(summary)
    }
}
