//! Per-invocation transaction context

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{LedgerStore, WriteSet};
use crate::error::Result;

/// One invocation against the ledger.
///
/// Reads see this transaction's own pending writes. Nothing reaches the
/// store until [`Transaction::commit`]; dropping the transaction discards
/// every buffered write.
pub struct Transaction {
    store: Arc<dyn LedgerStore>,
    tx_id: String,
    performer: String,
    timestamp: DateTime<Utc>,
    write_set: WriteSet,
}

impl Transaction {
    pub fn begin(store: Arc<dyn LedgerStore>, performer: impl Into<String>) -> Self {
        Self {
            store,
            tx_id: Uuid::new_v4().to_string(),
            performer: performer.into(),
            timestamp: Utc::now(),
            write_set: WriteSet::default(),
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub fn performer(&self) -> &str {
        &self.performer
    }

    /// Transaction time, shared by every stamp written in this transaction.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub async fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(pending) = self.write_set.writes.get(key) {
            return Ok(Some(pending.clone()));
        }

        let stored = self.store.get(key).await?;
        self.write_set
            .reads
            .entry(key.to_string())
            .or_insert_with(|| stored.as_ref().map(|s| s.version));

        Ok(stored.map(|s| s.value))
    }

    pub fn put_state(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.write_set.writes.insert(key.into(), value);
    }

    /// Committed entries in `[start, end)`. Range reads are not tracked in
    /// the read set and do not observe pending writes.
    pub async fn scan_range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.store.scan_range(start, end).await
    }

    pub async fn commit(self) -> Result<()> {
        if self.write_set.is_empty() {
            return Ok(());
        }
        let writes = self.write_set.writes.len();
        self.store.commit(self.write_set).await?;
        debug!("Transaction {} committed {} writes", self.tx_id, writes);
        Ok(())
    }
}
