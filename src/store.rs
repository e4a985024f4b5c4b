//! Job record persistence store.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::error::StoreError;

/// A staged write operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BatchOp {
    Put { key: String, value: Value },
    Delete { key: String },
}

/// An ordered batch of staged writes, applied by [`JobStore::commit`].
///
/// The two-phase write discipline is explicit: stage puts and deletes on the
/// batch, then hand the batch to `commit` to flush. Nothing is visible in
/// the store until the commit, and operations apply in staging order.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Stage a write of `value` under `key`.
    pub fn put(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value,
        });
        self
    }

    /// Stage a deletion of `key`.
    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Delete { key: key.into() });
        self
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch has no staged operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Key-value store for job records.
///
/// Lookups report a missing record as `None`, never as an error. `commit`
/// applies a [`WriteBatch`] in staging order; the first failing operation
/// aborts the commit with its error, and already-applied operations stay
/// applied unless the backend is transactional.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Point lookup.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Batched lookup, positionally aligned with `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError>;

    /// Write a record immediately.
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Delete a record. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Apply a batch of staged writes.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// In-memory job store for testing.
pub struct MemoryJobStore {
    records: tokio::sync::RwLock<HashMap<String, Value>>,
}

impl MemoryJobStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            records: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        let records = self.records.read().await;
        Ok(keys.iter().map(|key| records.get(key).cloned()).collect())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.remove(key);
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    records.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    records.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// File system based job store.
///
/// Records are stored as individual JSON files named after their key:
/// ```text
/// {root}/
/// └── records/
///     ├── ids.json
///     └── job.{id}.json
/// ```
pub struct FileJobStore {
    /// Base storage path.
    root: PathBuf,
}

impl FileJobStore {
    /// Create a new file-based job store.
    ///
    /// # Arguments
    /// * `root` - Base directory for record files
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join("records")).await?;

        debug!("FileJobStore initialized at {:?}", root);

        Ok(Self { root })
    }

    /// Get the records directory path.
    fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    /// Get the file path for a record key.
    fn record_path(&self, key: &str) -> PathBuf {
        self.records_dir()
            .join(format!("{}.json", Self::sanitize_key(key)))
    }

    /// Sanitize a key for use as a file name.
    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    async fn write_record(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.record_path(key);

        let content = serde_json::to_string_pretty(value)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize record: {}", e)))?;

        fs::write(&path, content).await?;

        debug!("Saved record '{}' to {:?}", key, path);
        Ok(())
    }

    async fn remove_record(&self, key: &str) -> Result<(), StoreError> {
        let path = self.record_path(key);
        if path.exists() {
            fs::remove_file(&path).await?;
            debug!("Deleted record '{}'", key);
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;

        let value = serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("Failed to deserialize record: {}", e))
        })?;

        Ok(Some(value))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.write_record(key, &value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.remove_record(key).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => self.write_record(&key, &value).await?,
                BatchOp::Delete { key } => self.remove_record(&key).await?,
            }
        }
        Ok(())
    }
}
