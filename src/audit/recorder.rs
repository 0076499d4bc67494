//! Audit Trail Recorder
//!
//! Entries are written into the same transaction as the state change they
//! describe, so an entry exists if and only if that change committed. Each
//! entry key is derived from its subject key, which makes a subject's trail
//! one contiguous key range.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::audit::entry::{AuditEntry, TransactionType};
use crate::error::Result;
use crate::ledger::Transaction;
use crate::records::scanner::{scan_objects, ScanOutcome, SkippedRecord};

/// Namespace of audit entry keys
pub const AUDIT_NAMESPACE: &str = "audit";

const TRANSACTION_TYPE_FIELD: &str = "transactionType";

/// Key prefix shared by every entry about `subject_key`.
pub fn trail_prefix(subject_key: &str) -> String {
    format!("{}:{}:", AUDIT_NAMESPACE, subject_key)
}

/// Storage key of one entry. Zero-padded micros keep a subject's entries in
/// time order; the transaction id separates writes in the same microsecond.
pub fn entry_key(subject_key: &str, timestamp: DateTime<Utc>, transaction_id: &str) -> String {
    format!(
        "{}{:020}:{}",
        trail_prefix(subject_key),
        timestamp.timestamp_micros().max(0),
        transaction_id
    )
}

/// Append an entry for `subject_key` to the transaction's write set.
pub fn record(
    tx: &mut Transaction,
    transaction_type: TransactionType,
    subject_key: &str,
    hash: &str,
) -> Result<AuditEntry> {
    let entry = AuditEntry::new(
        transaction_type,
        tx.tx_id().to_string(),
        subject_key.to_string(),
        tx.timestamp(),
        tx.performer().to_string(),
        hash.to_string(),
    );

    let key = entry_key(subject_key, entry.timestamp, &entry.transaction_id);
    tx.put_state(key, serde_json::to_vec(&entry)?);

    info!("Recorded audit entry: {}", entry.summary());
    Ok(entry)
}

/// Every entry recorded for `subject_key`, oldest first. Entries under the
/// prefix that name another subject are reported as skipped.
pub async fn trail(tx: &Transaction, subject_key: &str) -> Result<ScanOutcome<AuditEntry>> {
    let scanned = scan_objects(tx, &trail_prefix(subject_key)).await?;

    let mut outcome = ScanOutcome {
        records: Vec::new(),
        skipped: scanned.skipped,
    };

    for (key, object) in scanned.records {
        if !object.contains_key(TRANSACTION_TYPE_FIELD) {
            debug!("Ignoring {}: not an audit entry", key);
            continue;
        }
        match serde_json::from_value::<AuditEntry>(Value::Object(object)) {
            Ok(entry) if entry.subject_key == subject_key => outcome.records.push(entry),
            Ok(entry) => {
                warn!("Audit entry {} names subject {}, expected {}", key, entry.subject_key, subject_key);
                outcome.skipped.push(SkippedRecord {
                    key,
                    reason: format!("entry belongs to {}", entry.subject_key),
                });
            }
            Err(e) => outcome.skipped.push(SkippedRecord {
                key,
                reason: e.to_string(),
            }),
        }
    }

    outcome.records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    debug!(
        "Audit trail for {}: {} entries, {} skipped",
        subject_key,
        outcome.records.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerStore, MemoryLedger, WriteSet};
    use std::sync::Arc;

    #[test]
    fn test_entry_keys_do_not_leak_across_subjects() {
        let now = Utc::now();
        let key = entry_key("result:100", now, "tx");
        assert!(key.starts_with(&trail_prefix("result:100")));
        assert!(!key.starts_with(&trail_prefix("result:10")));
    }

    #[tokio::test]
    async fn test_record_and_trail() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());

        let mut tx = Transaction::begin(store.clone(), "admin");
        record(&mut tx, TransactionType::Verify, "result:10", "h1").unwrap();
        tx.commit().await.unwrap();

        let mut tx = Transaction::begin(store.clone(), "admin");
        record(&mut tx, TransactionType::Verify, "result:100", "h2").unwrap();
        tx.commit().await.unwrap();

        let tx = Transaction::begin(store, "reader");
        let trail10 = trail(&tx, "result:10").await.unwrap();
        assert_eq!(trail10.len(), 1);
        assert_eq!(trail10.records[0].hash, "h1");
        assert_eq!(trail10.records[0].performer, "admin");
        assert!(trail10.records[0].verify_hash());
    }

    #[tokio::test]
    async fn test_uncommitted_entry_is_invisible() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        {
            let mut tx = Transaction::begin(store.clone(), "admin");
            record(&mut tx, TransactionType::Verify, "result:1", "h").unwrap();
        }
        let tx = Transaction::begin(store, "reader");
        assert!(trail(&tx, "result:1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trail_skips_noise_under_prefix() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        store
            .commit(WriteSet::single("audit:result:5:junk", b"not json".to_vec()))
            .await
            .unwrap();
        store
            .commit(WriteSet::single("audit:result:5:other", br#"{"note":"x"}"#.to_vec()))
            .await
            .unwrap();

        let tx = Transaction::begin(store, "reader");
        let outcome = trail(&tx, "result:5").await.unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[tokio::test]
    async fn test_trail_rejects_entry_for_another_subject() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let planted = AuditEntry::new(
            TransactionType::Verify,
            "tx-9".to_string(),
            "result:99".to_string(),
            Utc::now(),
            "admin".to_string(),
            "h".to_string(),
        );
        let key = entry_key("result:5", planted.timestamp, "tx-9");
        store
            .commit(WriteSet::single(key.clone(), serde_json::to_vec(&planted).unwrap()))
            .await
            .unwrap();

        let tx = Transaction::begin(store, "reader");
        let outcome = trail(&tx, "result:5").await.unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].key, key);
        assert!(outcome.skipped[0].reason.contains("result:99"));
    }
}
