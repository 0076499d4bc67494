//! Ledger Substrate
//!
//! Durable key -> bytes world state with versioned keys. Every exposed
//! operation runs inside one [`Transaction`]; its buffered writes are applied
//! atomically by [`LedgerStore::commit`], which also rejects the batch if any
//! key it read has changed since (optimistic per-key conflict detection).

pub mod memory;
pub mod sqlite;
pub mod transaction;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, LedgerBackend};
use crate::error::Result;

pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use transaction::Transaction;

/// Monotonic per-key version, bumped on every committed write.
pub type Version = u64;

/// Value plus the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: Vec<u8>,
    pub version: Version,
}

/// Read and write sets of one transaction, handed to the store on commit
#[derive(Debug, Clone, Default)]
pub struct WriteSet {
    /// Version observed for each read key; `None` means the key was absent.
    pub reads: BTreeMap<String, Option<Version>>,
    pub writes: BTreeMap<String, Vec<u8>>,
}

impl WriteSet {
    /// Unconditional single-key write, bypassing the transaction layer.
    pub fn single(key: impl Into<String>, value: Vec<u8>) -> Self {
        let mut writes = BTreeMap::new();
        writes.insert(key.into(), value);
        Self {
            reads: BTreeMap::new(),
            writes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Primitives the record store is built on
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current value and version of `key`.
    async fn get(&self, key: &str) -> Result<Option<StoredValue>>;

    /// All entries with `start <= key < end`, ascending. An empty `end`
    /// leaves the range open.
    async fn scan_range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Validate the read set and apply every write, or apply nothing.
    async fn commit(&self, write_set: WriteSet) -> Result<()>;
}

/// Open the backend selected in `config`.
pub async fn open(config: &AppConfig) -> Result<Arc<dyn LedgerStore>> {
    match config.ledger_backend {
        LedgerBackend::Memory => {
            info!("Using in-memory ledger");
            Ok(Arc::new(MemoryLedger::new()))
        }
        LedgerBackend::Sqlite => Ok(Arc::new(SqliteLedger::connect(&config.database_url).await?)),
    }
}

/// Half-open range covering every key that starts with `prefix`.
pub fn prefix_range(prefix: &str) -> (String, String) {
    let mut end: Vec<char> = prefix.chars().collect();
    while let Some(last) = end.pop() {
        if let Some(next) = char::from_u32(last as u32 + 1) {
            end.push(next);
            return (prefix.to_string(), end.into_iter().collect());
        }
    }
    (prefix.to_string(), String::new())
}
