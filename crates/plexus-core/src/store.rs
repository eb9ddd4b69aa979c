//! ConnectionStore: the persistence contract behind the connection matrix.
//!
//! This is a trait rather than a concrete type so that different deployments
//! can keep connections in SQLite, a key-value service, or plain memory.
//! Every call may suspend on I/O; the engine wraps each one in a timeout.

use crate::error::StorageResult;
use crate::types::{ConnectionKey, ConnectionRow};
use async_trait::async_trait;

/// Abstract interface for connection persistence.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Load every persisted row. Called once at startup.
    async fn load_all(&self) -> StorageResult<Vec<ConnectionRow>>;

    /// Insert or replace the row stored under `row.canonical_key`.
    async fn upsert(&self, row: ConnectionRow) -> StorageResult<()>;

    /// Delete the row for `key`. Deleting a missing row is not an error.
    async fn delete(&self, key: &ConnectionKey) -> StorageResult<()>;

    /// Number of persisted rows.
    async fn count(&self) -> StorageResult<usize>;
}
