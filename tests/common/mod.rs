#![allow(dead_code)]

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use srs_ledger::ledger::{LedgerStore, MemoryLedger, SqliteLedger, WriteSet};
use srs_ledger::RecordsContract;

/// Contract over a fresh in-memory ledger
pub fn memory_contract() -> RecordsContract {
    RecordsContract::new(Arc::new(MemoryLedger::new()))
}

/// Contract over a SQLite ledger in a temporary directory. Keep the
/// returned directory alive for the duration of the test.
pub async fn sqlite_contract() -> (RecordsContract, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
    let ledger = SqliteLedger::connect(&url)
        .await
        .expect("Failed to open SQLite ledger");
    (RecordsContract::new(Arc::new(ledger)), dir)
}

pub fn typed<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("Invalid test payload")
}

/// Overwrite raw bytes under `key`, bypassing every check.
pub async fn write_raw(store: &Arc<dyn LedgerStore>, key: &str, bytes: &[u8]) {
    store
        .commit(WriteSet::single(key, bytes.to_vec()))
        .await
        .expect("Failed to write raw value");
}

/// Change one field of a stored JSON record without touching its hash.
pub async fn tamper_field(store: &Arc<dyn LedgerStore>, key: &str, field: &str, value: Value) {
    let stored = store
        .get(key)
        .await
        .expect("Failed to read record")
        .expect("Record to tamper with is missing");
    let mut object: Value = serde_json::from_slice(&stored.value).expect("Stored record is not JSON");
    object[field] = value;
    write_raw(store, key, &serde_json::to_vec(&object).expect("Failed to encode")).await;
}

pub fn grade_payload(enrollment_id: u64, numeric_grade: &str) -> Value {
    serde_json::json!({
        "enrollmentId": enrollment_id,
        "studentNumber": "102",
        "courseCode": "mt101",
        "semester": "1",
        "academicYear": "2024/2025",
        "gradeType": "NUMERIC",
        "numericGrade": numeric_grade,
        "courseWorkGrade": "30.00",
        "examGrade": "52.00",
        "submittedById": 5,
        "lecturerName": "Dr. Mwale"
    })
}
