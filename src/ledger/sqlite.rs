//! SQLite-backed world state

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use super::{LedgerStore, StoredValue, Version, WriteSet};
use crate::error::{LedgerError, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS world_state (
    key     TEXT PRIMARY KEY NOT NULL,
    value   BLOB NOT NULL,
    version INTEGER NOT NULL
)
"#;

#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // SQLite has a single writer; one connection keeps commits serialized
        // and lets `sqlite::memory:` behave as one database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;
        info!("SQLite ledger ready at {}", database_url);
        Ok(ledger)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

fn to_version(raw: i64) -> Version {
    raw.max(0) as Version
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let row = sqlx::query("SELECT value, version FROM world_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| StoredValue {
            value: row.get::<Vec<u8>, _>("value"),
            version: to_version(row.get::<i64, _>("version")),
        }))
    }

    async fn scan_range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let rows = if end.is_empty() {
            sqlx::query("SELECT key, value FROM world_state WHERE key >= ? ORDER BY key")
                .bind(start)
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query(
                "SELECT key, value FROM world_state WHERE key >= ? AND key < ? ORDER BY key",
            )
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("key"), row.get::<Vec<u8>, _>("value")))
            .collect())
    }

    async fn commit(&self, write_set: WriteSet) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (key, expected) in &write_set.reads {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT version FROM world_state WHERE key = ?")
                    .bind(key)
                    .fetch_optional(&mut *tx)
                    .await?;
            if current.map(to_version) != *expected {
                // Dropping `tx` rolls back.
                return Err(LedgerError::Conflict(key.clone()));
            }
        }

        for (key, value) in &write_set.writes {
            sqlx::query(
                r#"
                INSERT INTO world_state (key, value, version)
                VALUES (?, ?, 1)
                ON CONFLICT (key) DO UPDATE SET
                    value = excluded.value,
                    version = world_state.version + 1
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Committed {} writes to SQLite ledger", write_set.writes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn temp_ledger() -> (tempfile::TempDir, SqliteLedger) {
        let dir = tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
        let ledger = SqliteLedger::connect(&url).await.unwrap();
        (dir, ledger)
    }

    #[tokio::test]
    async fn test_commit_and_get() {
        let (_dir, ledger) = temp_ledger().await;
        ledger.commit(WriteSet::single("student:1", b"{}".to_vec())).await.unwrap();
        ledger.commit(WriteSet::single("student:1", b"[]".to_vec())).await.unwrap();

        let stored = ledger.get("student:1").await.unwrap().unwrap();
        assert_eq!(stored.value, b"[]".to_vec());
        assert_eq!(stored.version, 2);
        assert!(ledger.get("student:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_whole_batch() {
        let (_dir, ledger) = temp_ledger().await;
        ledger.commit(WriteSet::single("a", b"1".to_vec())).await.unwrap();

        let mut batch = WriteSet::default();
        batch.reads.insert("a".to_string(), Some(7));
        batch.writes.insert("a".to_string(), b"2".to_vec());
        batch.writes.insert("b".to_string(), b"2".to_vec());

        assert!(matches!(ledger.commit(batch).await, Err(LedgerError::Conflict(_))));
        assert_eq!(ledger.get("a").await.unwrap().unwrap().value, b"1".to_vec());
        assert!(ledger.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scan_range_is_ordered() {
        let (_dir, ledger) = temp_ledger().await;
        for key in ["result:2", "result:1", "student:1"] {
            ledger.commit(WriteSet::single(key, b"{}".to_vec())).await.unwrap();
        }

        let keys: Vec<String> = ledger
            .scan_range("result:", "result;")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["result:1", "result:2"]);
    }
}
