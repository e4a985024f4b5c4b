//! SQLite-backed job store.

use async_trait::async_trait;
use rusqlite::params;
use serde_json::Value;
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::error::StoreError;
use crate::store::{BatchOp, JobStore, WriteBatch};

/// Database schema for the record table.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// SQLite-backed job store.
///
/// All records live in a single `records` table keyed by record key, with
/// the JSON value stored as text. Batches apply inside one transaction, so
/// a failed commit leaves the store unchanged.
pub struct SqliteJobStore {
    conn: Connection,
}

impl SqliteJobStore {
    /// Open a store backed by a database file, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::init(conn).await
    }

    /// Open a store backed by an in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!("SqliteJobStore schema initialized");

        Ok(Self { conn })
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let key = key.to_string();

        let content = self
            .conn
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT value FROM records WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(content) => Ok(Some(content)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match content {
            Some(content) => {
                let value = serde_json::from_str(&content).map_err(|e| {
                    StoreError::Serialization(format!("Failed to deserialize record: {}", e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        let keys = keys.to_vec();

        let contents = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM records WHERE key = ?1")?;
                let mut contents = Vec::with_capacity(keys.len());
                for key in &keys {
                    let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
                    match result {
                        Ok(content) => contents.push(Some(content)),
                        Err(rusqlite::Error::QueryReturnedNoRows) => contents.push(None),
                        Err(e) => return Err(e.into()),
                    }
                }
                Ok(contents)
            })
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        contents
            .into_iter()
            .map(|content| match content {
                Some(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
                    StoreError::Serialization(format!("Failed to deserialize record: {}", e))
                }),
                None => Ok(None),
            })
            .collect()
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let key = key.to_string();
        let content = serde_json::to_string(&value)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize record: {}", e)))?;

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO records (key, value) VALUES (?1, ?2)",
                    params![key, content],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();

        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM records WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        // Serialize outside the connection closure so JSON failures abort
        // before the transaction starts.
        let mut ops = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            ops.push(match op {
                BatchOp::Put { key, value } => {
                    let content = serde_json::to_string(&value).map_err(|e| {
                        StoreError::Serialization(format!("Failed to serialize record: {}", e))
                    })?;
                    (key, Some(content))
                }
                BatchOp::Delete { key } => (key, None),
            });
        }

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for (key, content) in ops {
                    match content {
                        Some(content) => {
                            tx.execute(
                                "INSERT OR REPLACE INTO records (key, value) VALUES (?1, ?2)",
                                params![key, content],
                            )?;
                        }
                        None => {
                            tx.execute("DELETE FROM records WHERE key = ?1", params![key])?;
                        }
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
