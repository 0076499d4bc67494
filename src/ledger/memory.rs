//! In-memory world state, used by tests and the `memory` backend.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{LedgerStore, StoredValue, WriteSet};
use crate::error::{LedgerError, Result};

#[derive(Clone, Default)]
pub struct MemoryLedger {
    state: Arc<RwLock<BTreeMap<String, StoredValue>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        Ok(self.state.read().await.get(key).cloned())
    }

    async fn scan_range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let state = self.state.read().await;
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end.to_string())
        };
        Ok(state
            .range((Bound::Included(start.to_string()), upper))
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect())
    }

    async fn commit(&self, write_set: WriteSet) -> Result<()> {
        let mut state = self.state.write().await;

        for (key, expected) in &write_set.reads {
            let current = state.get(key).map(|v| v.version);
            if current != *expected {
                return Err(LedgerError::Conflict(key.clone()));
            }
        }

        for (key, value) in write_set.writes {
            let version = state.get(&key).map(|v| v.version + 1).unwrap_or(1);
            state.insert(key, StoredValue { value, version });
        }

        debug!("Committed write set ({} keys in state)", state.len());
        Ok(())
    }
}
