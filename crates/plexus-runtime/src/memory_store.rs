//! In-memory connection store.
//!
//! Keeps rows in a `HashMap` behind a `RwLock`. Useful for tests, embedded
//! use, and as the reference behaviour for persistent backends.

use async_trait::async_trait;
use plexus_core::error::{StorageError, StorageResult};
use plexus_core::store::ConnectionStore;
use plexus_core::types::{ConnectionKey, ConnectionRow};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory connection store.
///
/// # Example
///
/// ```rust
/// use plexus_core::prelude::*;
/// use plexus_runtime::memory_store::InMemoryConnectionStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryConnectionStore::new();
///     let key = ConnectionKey::new(&EntityId::from("a"), &EntityId::from("b"))?;
///     let record = ConnectionRecord::new(key.clone(), 0.5, 0.1, 0.01, chrono::Utc::now());
///
///     store.upsert(record.to_row()).await?;
///     assert_eq!(store.count().await?, 1);
///
///     store.delete(&key).await?;
///     store.delete(&key).await?;
///     assert_eq!(store.count().await?, 0);
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct InMemoryConnectionStore {
    rows: RwLock<HashMap<String, ConnectionRow>>,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `rows`, as if persisted earlier.
    ///
    /// Rows are stored as given, without validation.
    pub fn with_rows(rows: impl IntoIterator<Item = ConnectionRow>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| (row.canonical_key.clone(), row))
            .collect();
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Get the row stored under `key`, if any.
    pub fn get(&self, key: &ConnectionKey) -> StorageResult<Option<ConnectionRow>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StorageError::permanent(format!("Failed to acquire read lock: {}", e)))?;
        Ok(rows.get(&key.to_string()).cloned())
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn load_all(&self) -> StorageResult<Vec<ConnectionRow>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StorageError::permanent(format!("Failed to acquire read lock: {}", e)))?;

        Ok(rows.values().cloned().collect())
    }

    async fn upsert(&self, row: ConnectionRow) -> StorageResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StorageError::permanent(format!("Failed to acquire write lock: {}", e)))?;

        rows.insert(row.canonical_key.clone(), row);
        Ok(())
    }

    async fn delete(&self, key: &ConnectionKey) -> StorageResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StorageError::permanent(format!("Failed to acquire write lock: {}", e)))?;

        rows.remove(&key.to_string());
        Ok(())
    }

    async fn count(&self) -> StorageResult<usize> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StorageError::permanent(format!("Failed to acquire read lock: {}", e)))?;

        Ok(rows.len())
    }
}
