//! Range Scanner
//!
//! Best-effort enumeration of stored records. A scan never aborts on a
//! corrupt value: unreadable entries are logged, reported in
//! [`ScanOutcome::skipped`] and the scan carries on. Order follows the
//! substrate and callers must not depend on it.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::store::{from_object, parse_object, type_tag};
use super::Entity;
use crate::error::Result;
use crate::ledger::{prefix_range, Transaction};

/// A key the scan could not use, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub key: String,
    pub reason: String,
}

/// Records matched by a scan plus the keys it had to skip
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Default for ScanOutcome<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> ScanOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn skip(&mut self, key: String, reason: impl ToString) {
        let reason = reason.to_string();
        warn!("Skipping unreadable record {}: {}", key, reason);
        self.skipped.push(SkippedRecord { key, reason });
    }
}

/// Every record of type `T`.
pub async fn scan<T: Entity>(tx: &Transaction) -> Result<ScanOutcome<T>> {
    scan_filtered(tx, |_| true).await
}

/// Records of type `T` accepted by `keep`.
pub async fn scan_filtered<T, F>(tx: &Transaction, keep: F) -> Result<ScanOutcome<T>>
where
    T: Entity,
    F: Fn(&T) -> bool,
{
    let (start, end) = prefix_range(&T::KIND.namespace());
    let entries = tx.scan_range(&start, &end).await?;

    let mut outcome = ScanOutcome::default();
    for (key, bytes) in entries {
        let object = match parse_object(&key, &bytes) {
            Ok(object) => object,
            Err(e) => {
                outcome.skip(key, e);
                continue;
            }
        };
        if type_tag(&object) != Some(T::KIND.as_str()) {
            debug!("Ignoring {} in {} namespace: foreign type tag", key, T::KIND);
            continue;
        }
        match from_object::<T>(&key, object) {
            Ok(record) if keep(&record) => outcome.records.push(record),
            Ok(_) => {}
            Err(e) => outcome.skip(key, e),
        }
    }

    debug!(
        "Scanned {} namespace: {} matched, {} skipped",
        T::KIND,
        outcome.records.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

/// Parsed JSON objects for every key starting with `prefix`, keyed by their
/// storage key. Values that are not JSON objects are skipped.
pub async fn scan_objects(
    tx: &Transaction,
    prefix: &str,
) -> Result<ScanOutcome<(String, Map<String, Value>)>> {
    let (start, end) = prefix_range(prefix);
    let entries = tx.scan_range(&start, &end).await?;

    let mut outcome = ScanOutcome::default();
    for (key, bytes) in entries {
        match parse_object(&key, &bytes) {
            Ok(object) => outcome.records.push((key, object)),
            Err(e) => outcome.skip(key, e),
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerStore, MemoryLedger, WriteSet};
    use crate::records::{store, Course, Student};
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    async fn seeded() -> Arc<dyn LedgerStore> {
        let store_ref: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let mut tx = Transaction::begin(store_ref.clone(), "seed");
        for id in ["101", "102", "103"] {
            let s: Student = serde_json::from_value(json!({"studentId": id})).unwrap();
            store::create(&mut tx, s).await.unwrap();
        }
        let c: Course = serde_json::from_value(json!({"courseId": "cs101"})).unwrap();
        store::create(&mut tx, c).await.unwrap();
        tx.commit().await.unwrap();
        store_ref
    }

    #[tokio::test]
    async fn test_scan_returns_only_requested_type() {
        let ledger = seeded().await;
        let tx = Transaction::begin(ledger, "reader");

        let students = scan::<Student>(&tx).await.unwrap();
        assert_eq!(students.len(), 3);
        assert!(students.is_complete());

        let courses = scan::<Course>(&tx).await.unwrap();
        assert_eq!(courses.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_value_is_skipped_not_fatal() {
        let ledger = seeded().await;
        ledger
            .commit(WriteSet::single("student:0-corrupt", b"\xff\xfe garbage".to_vec()))
            .await
            .unwrap();
        ledger
            .commit(WriteSet::single("student:104", br#"{"type":"student","yearOfStudy":"two"}"#.to_vec()))
            .await
            .unwrap();
        ledger
            .commit(WriteSet::single("student:105", br#"{"type":"course","courseId":"x"}"#.to_vec()))
            .await
            .unwrap();

        let tx = Transaction::begin(ledger, "reader");
        let students = scan::<Student>(&tx).await.unwrap();

        assert_eq!(students.len(), 3);
        let skipped: Vec<&str> = students.skipped.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(skipped, vec!["student:0-corrupt", "student:104"]);
    }

    #[tokio::test]
    async fn test_repeated_scans_return_same_set() {
        let ledger = seeded().await;
        let tx = Transaction::begin(ledger, "reader");

        let ids = |outcome: ScanOutcome<Student>| -> BTreeSet<String> {
            outcome
                .records
                .into_iter()
                .filter_map(|s| s.student_id.map(|id| id.to_string()))
                .collect()
        };

        let first = ids(scan::<Student>(&tx).await.unwrap());
        let second = ids(scan::<Student>(&tx).await.unwrap());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_scan_filtered() {
        let ledger = seeded().await;
        let tx = Transaction::begin(ledger, "reader");
        let only = scan_filtered::<Student, _>(&tx, |s| {
            s.student_id.as_ref().map(|id| id.as_str()) == Some("102")
        })
        .await
        .unwrap();
        assert_eq!(only.len(), 1);
    }
}
