//! ConnectionMatrix: the authoritative in-memory view of all connections.
//!
//! Records are keyed by canonical pair and cached in a `HashMap`; every
//! mutation is written through to the [`ConnectionStore`] before it becomes
//! visible in memory, so a failed or timed-out write leaves the matrix as it
//! was. Queries take a short synchronous read lock and never suspend.
//!
//! Mutators are crate-private: the plasticity engine is the only code path
//! that changes strengths. It serializes work on each key through
//! [`ConnectionMatrix::lock`], while different keys proceed independently.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use plexus_core::config::{PlasticityConfig, StrengthBounds};
use plexus_core::error::{PlasticityResult, StorageError, StorageResult};
use plexus_core::store::ConnectionStore;
use plexus_core::types::*;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

/// Run a store call under `timeout`, mapping expiry to `StorageError::Timeout`.
pub(crate) async fn with_timeout<T>(
    operation: &'static str,
    timeout: Duration,
    call: impl Future<Output = StorageResult<T>>,
) -> StorageResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout { operation, timeout }),
    }
}

/// A strength change applied by [`ConnectionMatrix::set_strength`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct StrengthUpdate {
    /// New strength, clamped into bounds before it is stored.
    pub strength: f64,
    /// When the change happened.
    pub at: DateTime<Utc>,
    /// `Some(success)` when the change comes from a reported interaction.
    pub outcome: Option<bool>,
}

/// Exclusive hold on one connection key. Releasing it reclaims the lock
/// entry once no other task is waiting for it.
pub(crate) struct KeyGuard<'a> {
    matrix: &'a ConnectionMatrix,
    key: ConnectionKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.matrix
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// In-memory, write-through cache of every connection record.
pub struct ConnectionMatrix {
    records: RwLock<HashMap<ConnectionKey, ConnectionRecord>>,
    /// Known population, including entities with no connections left.
    /// Only grows while the process runs; rebuilt from connection endpoints
    /// on load.
    entities: RwLock<BTreeSet<EntityId>>,
    locks: DashMap<ConnectionKey, Arc<Mutex<()>>>,
    store: Arc<dyn ConnectionStore>,
    bounds: StrengthBounds,
    default_strength: f64,
    learning_rate: f64,
    decay_rate: f64,
}

impl ConnectionMatrix {
    pub fn new(store: Arc<dyn ConnectionStore>, config: &PlasticityConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            entities: RwLock::new(BTreeSet::new()),
            locks: DashMap::new(),
            store,
            bounds: config.bounds,
            default_strength: config.default_strength,
            learning_rate: config.learning_rate,
            decay_rate: config.decay_rate,
        }
    }

    fn read_records(&self) -> RwLockReadGuard<'_, HashMap<ConnectionKey, ConnectionRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionKey, ConnectionRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entities(&self) -> RwLockWriteGuard<'_, BTreeSet<EntityId>> {
        self.entities.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bulk-load persisted rows.
    ///
    /// Rows that fail validation are dropped with a warning; the rest still
    /// load. Returns the number of records loaded.
    pub fn initialize(&self, rows: Vec<ConnectionRow>) -> usize {
        let mut loaded = 0usize;
        let mut dropped = 0usize;

        let mut records = self.write_records();
        let mut entities = self.write_entities();
        for row in rows {
            match row.into_record(&self.bounds) {
                Ok(record) => {
                    entities.insert(record.key.first().clone());
                    entities.insert(record.key.second().clone());
                    records.insert(record.key.clone(), record);
                    loaded += 1;
                }
                Err(e) => {
                    dropped += 1;
                    warn!("Dropping malformed connection row: {}", e);
                }
            }
        }

        info!(
            loaded,
            dropped,
            store = self.store.name(),
            "Connection matrix initialized"
        );
        loaded
    }

    /// Load every row from the store and initialize from them.
    pub(crate) async fn load_from_store(&self, timeout: Duration) -> PlasticityResult<usize> {
        let rows = with_timeout("load_all", timeout, self.store.load_all()).await?;
        Ok(self.initialize(rows))
    }

    /// Strength of the pair, or the neutral default when there is no record
    /// (or the pair is invalid). Symmetric in `a` and `b`.
    pub fn get_strength(&self, a: &EntityId, b: &EntityId) -> f64 {
        self.get(a, b)
            .map_or(self.default_strength, |record| record.strength)
    }

    /// Snapshot of the record for a pair, if one exists.
    pub fn get(&self, a: &EntityId, b: &EntityId) -> Option<ConnectionRecord> {
        let key = ConnectionKey::new(a, b).ok()?;
        self.record(&key)
    }

    /// Snapshot of the record stored under `key`.
    pub fn record(&self, key: &ConnectionKey) -> Option<ConnectionRecord> {
        self.read_records().get(key).cloned()
    }

    pub fn contains(&self, key: &ConnectionKey) -> bool {
        self.read_records().contains_key(key)
    }

    /// Number of connections.
    pub fn len(&self) -> usize {
        self.read_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_records().is_empty()
    }

    /// Snapshot of every record, ordered by key.
    pub fn records(&self) -> Vec<ConnectionRecord> {
        let mut records: Vec<ConnectionRecord> = self.read_records().values().cloned().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    /// Every known entity, in id order.
    ///
    /// The population is not persisted. After a restart it holds exactly the
    /// endpoints of the stored connections; registered entities without a
    /// connection, and endpoints whose last connection was pruned, are gone.
    pub fn entities(&self) -> Vec<EntityId> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Size of [`Self::entities`].
    pub fn entity_count(&self) -> usize {
        self.entities.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn default_strength(&self) -> f64 {
        self.default_strength
    }

    pub fn bounds(&self) -> StrengthBounds {
        self.bounds
    }

    /// Peers of `entity`, strongest first.
    ///
    /// Ties are broken by the most recent interaction (never-interacted pairs
    /// last), then by peer id.
    pub fn strongest_connections(&self, entity: &EntityId, limit: usize) -> Vec<(EntityId, f64)> {
        let records = self.read_records();
        let mut peers: Vec<(&EntityId, f64, Option<DateTime<Utc>>)> = records
            .values()
            .filter_map(|r| {
                r.peer_of(entity)
                    .map(|peer| (peer, r.strength, r.last_interaction_at))
            })
            .collect();

        peers.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.0.cmp(b.0))
        });

        peers
            .into_iter()
            .take(limit)
            .map(|(peer, strength, _)| (peer.clone(), strength))
            .collect()
    }

    /// Every record with `strength < threshold`, ordered by key.
    pub fn below_threshold(&self, threshold: f64) -> Vec<ConnectionRecord> {
        let mut weak: Vec<ConnectionRecord> = self
            .read_records()
            .values()
            .filter(|r| r.strength < threshold)
            .cloned()
            .collect();
        weak.sort_by(|a, b| a.key.cmp(&b.key));
        weak
    }

    /// Add an entity to the known population. Returns false if already known.
    pub(crate) fn register_entity(&self, id: EntityId) -> bool {
        self.write_entities().insert(id)
    }

    /// Wait for exclusive access to `key`.
    pub(crate) async fn lock(&self, key: &ConnectionKey) -> KeyGuard<'_> {
        let lock = Arc::clone(&self.locks.entry(key.clone()).or_default());
        let guard = lock.lock_owned().await;
        KeyGuard {
            matrix: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Write a new strength for `key`, creating the record if needed.
    ///
    /// The value is clamped into bounds and `last_interaction_at` never moves
    /// backwards. Callers must hold the key's lock.
    pub(crate) async fn set_strength(
        &self,
        key: &ConnectionKey,
        update: StrengthUpdate,
        timeout: Duration,
    ) -> PlasticityResult<ConnectionRecord> {
        let mut record = self.record(key).unwrap_or_else(|| {
            ConnectionRecord::new(
                key.clone(),
                self.default_strength,
                self.learning_rate,
                self.decay_rate,
                update.at,
            )
        });

        record.strength = update.strength;
        record.last_interaction_at = Some(match record.last_interaction_at {
            Some(previous) if previous > update.at => previous,
            _ => update.at,
        });
        if let Some(success) = update.outcome {
            record.interaction_count += 1;
            if success {
                record.success_count += 1;
            }
        }

        self.commit(record, timeout).await
    }

    /// Persist a fully-formed record (used by population seeding).
    /// Callers must hold the key's lock.
    pub(crate) async fn insert(
        &self,
        record: ConnectionRecord,
        timeout: Duration,
    ) -> PlasticityResult<ConnectionRecord> {
        self.commit(record, timeout).await
    }

    async fn commit(
        &self,
        mut record: ConnectionRecord,
        timeout: Duration,
    ) -> PlasticityResult<ConnectionRecord> {
        record.strength = self.bounds.clamp(record.strength);

        // Store first: memory only changes once the write has landed.
        with_timeout("upsert", timeout, self.store.upsert(record.to_row())).await?;

        self.write_records().insert(record.key.clone(), record.clone());
        let mut entities = self.write_entities();
        entities.insert(record.key.first().clone());
        entities.insert(record.key.second().clone());
        Ok(record)
    }

    /// Delete `key` from store and memory. Removing a missing key is a no-op.
    /// Callers must hold the key's lock.
    pub(crate) async fn remove(
        &self,
        key: &ConnectionKey,
        timeout: Duration,
    ) -> PlasticityResult<Option<ConnectionRecord>> {
        with_timeout("delete", timeout, self.store.delete(key)).await?;
        Ok(self.write_records().remove(key))
    }
}
