//! SQLite-backed connection store.
//!
//! One row per canonical pair in a `connections` table, with indexes on both
//! endpoints. Timestamps are stored as RFC 3339 text with nanosecond
//! precision. Calls run on tokio's blocking pool so the async executor is
//! never stalled on disk I/O.

#![cfg(feature = "sqlite")]

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use plexus_core::error::{StorageError, StorageResult};
use plexus_core::store::ConnectionStore;
use plexus_core::types::{ConnectionKey, ConnectionRow};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// SQLite implementation of [`ConnectionStore`].
///
/// Supports both in-memory and file-backed databases.
pub struct SqliteConnectionStore {
    conn: Arc<Mutex<Connection>>,
}

/// Column values as read from SQLite, before timestamp parsing.
struct RawRow {
    canonical_key: String,
    entity_a: String,
    entity_b: String,
    strength: f64,
    interaction_count: i64,
    success_count: i64,
    last_interaction_at: Option<String>,
    created_at: String,
    learning_rate: f64,
    decay_rate: f64,
}

impl SqliteConnectionStore {
    /// Create a new in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        Self::init_with_connection(conn)
    }

    /// Create or open a file-backed database.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let conn = Connection::open(path).map_err(map_sqlite_error)?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS connections (
                canonical_key TEXT PRIMARY KEY,
                entity_a TEXT NOT NULL,
                entity_b TEXT NOT NULL,
                strength REAL NOT NULL,
                interaction_count INTEGER NOT NULL DEFAULT 0,
                success_count INTEGER NOT NULL DEFAULT 0,
                last_interaction_at TEXT,
                created_at TEXT NOT NULL,
                learning_rate REAL NOT NULL,
                decay_rate REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_connections_a ON connections(entity_a);
            CREATE INDEX IF NOT EXISTS idx_connections_b ON connections(entity_b);
            "#,
        )
        .map_err(map_sqlite_error)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<T, F>(&self, operation: &'static str, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StorageError::permanent(format!("Failed to acquire connection lock: {}", e))
            })?;
            f(&conn).map_err(map_sqlite_error)
        })
        .await
        .map_err(|e| StorageError::permanent(format!("SQLite {} task failed: {}", operation, e)))?
    }

    /// Get the row stored under `key`, if any.
    pub async fn get(&self, key: &ConnectionKey) -> StorageResult<Option<ConnectionRow>> {
        let canonical = key.to_string();
        let raw = self
            .run("get", move |conn| {
                conn.query_row(
                    &format!("{} WHERE canonical_key = ?1", SELECT_ROWS),
                    params![canonical],
                    read_raw,
                )
                .optional()
            })
            .await?;
        Ok(raw.and_then(into_row))
    }
}

const SELECT_ROWS: &str = "SELECT canonical_key, entity_a, entity_b, strength, \
     interaction_count, success_count, last_interaction_at, created_at, \
     learning_rate, decay_rate FROM connections";

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        canonical_key: row.get(0)?,
        entity_a: row.get(1)?,
        entity_b: row.get(2)?,
        strength: row.get(3)?,
        interaction_count: row.get(4)?,
        success_count: row.get(5)?,
        last_interaction_at: row.get(6)?,
        created_at: row.get(7)?,
        learning_rate: row.get(8)?,
        decay_rate: row.get(9)?,
    })
}

/// Convert a raw row, skipping it with a warning if a column can't be decoded.
fn into_row(raw: RawRow) -> Option<ConnectionRow> {
    match decode(&raw) {
        Ok(row) => Some(row),
        Err(reason) => {
            warn!(key = %raw.canonical_key, "Skipping undecodable connection row: {}", reason);
            None
        }
    }
}

fn decode(raw: &RawRow) -> Result<ConnectionRow, String> {
    let last_interaction_at = raw
        .last_interaction_at
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;
    let interaction_count = u64::try_from(raw.interaction_count)
        .map_err(|_| format!("negative interaction_count {}", raw.interaction_count))?;
    let success_count = u64::try_from(raw.success_count)
        .map_err(|_| format!("negative success_count {}", raw.success_count))?;

    Ok(ConnectionRow {
        canonical_key: raw.canonical_key.clone(),
        entity_a: raw.entity_a.clone(),
        entity_b: raw.entity_b.clone(),
        strength: raw.strength,
        interaction_count,
        success_count,
        last_interaction_at,
        created_at: parse_timestamp(&raw.created_at)?,
        learning_rate: raw.learning_rate,
        decay_rate: raw.decay_rate,
    })
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{}': {}", text, e))
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Busy and locked databases are worth retrying; anything else is not.
fn map_sqlite_error(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            StorageError::transient(e.to_string())
        }
        _ => StorageError::permanent(e.to_string()),
    }
}

#[async_trait]
impl ConnectionStore for SqliteConnectionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load_all(&self) -> StorageResult<Vec<ConnectionRow>> {
        let raw = self
            .run("load_all", |conn| {
                let mut stmt = conn.prepare(SELECT_ROWS)?;
                let rows = stmt.query_map([], read_raw)?;
                rows.collect::<rusqlite::Result<Vec<RawRow>>>()
            })
            .await?;
        Ok(raw.into_iter().filter_map(into_row).collect())
    }

    async fn upsert(&self, row: ConnectionRow) -> StorageResult<()> {
        self.run("upsert", move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO connections (canonical_key, entity_a, entity_b, strength, \
                 interaction_count, success_count, last_interaction_at, created_at, \
                 learning_rate, decay_rate) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row.canonical_key,
                    row.entity_a,
                    row.entity_b,
                    row.strength,
                    to_sql_count(row.interaction_count),
                    to_sql_count(row.success_count),
                    row.last_interaction_at.as_ref().map(format_timestamp),
                    format_timestamp(&row.created_at),
                    row.learning_rate,
                    row.decay_rate,
                ],
            )
            .map(|_| ())
        })
        .await
    }

    async fn delete(&self, key: &ConnectionKey) -> StorageResult<()> {
        let canonical = key.to_string();
        self.run("delete", move |conn| {
            conn.execute(
                "DELETE FROM connections WHERE canonical_key = ?1",
                params![canonical],
            )
            .map(|_| ())
        })
        .await
    }

    async fn count(&self) -> StorageResult<usize> {
        self.run("count", |conn| {
            conn.query_row("SELECT COUNT(*) FROM connections", [], |row| row.get::<_, i64>(0))
        })
        .await
        .map(|n| usize::try_from(n).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use plexus_core::types::{ConnectionRecord, EntityId};

    fn record(a: &str, b: &str) -> ConnectionRecord {
        let key = ConnectionKey::new(&EntityId::from(a), &EntityId::from(b)).unwrap();
        let created = Utc::now() - Duration::hours(3);
        let mut record = ConnectionRecord::new(key, 0.42, 0.1, 0.01, created);
        record.interaction_count = 7;
        record.success_count = 5;
        record.last_interaction_at = Some(Utc::now());
        record
    }

    #[tokio::test]
    async fn rows_survive_a_round_trip_with_full_precision() {
        let store = SqliteConnectionStore::open_in_memory().unwrap();
        let original = record("alice", "bob").to_row();

        store.upsert(original.clone()).await.unwrap();
        let loaded = store.load_all().await.unwrap();

        assert_eq!(loaded, vec![original.clone()]);
        let key = ConnectionKey::parse(&original.canonical_key).unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn upsert_replaces_and_delete_is_idempotent() {
        let store = SqliteConnectionStore::open_in_memory().unwrap();
        let mut r = record("a", "b");
        store.upsert(r.to_row()).await.unwrap();
        r.strength = 0.9;
        store.upsert(r.to_row()).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.load_all().await.unwrap()[0].strength, 0.9);

        store.delete(&r.key).await.unwrap();
        store.delete(&r.key).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn undecodable_timestamps_are_skipped() {
        let store = SqliteConnectionStore::open_in_memory().unwrap();
        store.upsert(record("a", "b").to_row()).await.unwrap();
        store.upsert(record("c", "d").to_row()).await.unwrap();
        store
            .run("corrupt", |conn| {
                conn.execute(
                    "UPDATE connections SET created_at = 'yesterday' WHERE entity_a = 'a'",
                    [],
                )
            })
            .await
            .unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].entity_a, "c");
    }

    #[tokio::test]
    async fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connections.db");
        {
            let store = SqliteConnectionStore::open(&path).unwrap();
            store.upsert(record("a", "b").to_row()).await.unwrap();
        }
        let store = SqliteConnectionStore::open(&path).unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
