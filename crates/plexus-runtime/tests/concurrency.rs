//! Concurrent updates to the connection matrix.
//!
//! Reports for the same pair must never be lost, and a slow write for one
//! pair must not hold up any other pair.

use async_trait::async_trait;
use plexus_core::prelude::*;
use plexus_runtime::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Delays every write, widening the window for lost updates.
struct SlowStore {
    inner: InMemoryConnectionStore,
    delay: Duration,
}

#[async_trait]
impl ConnectionStore for SlowStore {
    fn name(&self) -> &str {
        "slow"
    }

    async fn load_all(&self) -> StorageResult<Vec<ConnectionRow>> {
        self.inner.load_all().await
    }

    async fn upsert(&self, row: ConnectionRow) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.upsert(row).await
    }

    async fn delete(&self, key: &ConnectionKey) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn count(&self) -> StorageResult<usize> {
        self.inner.count().await
    }
}

/// Holds writes for one key until the gate opens.
struct GatedStore {
    inner: InMemoryConnectionStore,
    gated_key: String,
    gate: Arc<Notify>,
}

#[async_trait]
impl ConnectionStore for GatedStore {
    fn name(&self) -> &str {
        "gated"
    }

    async fn load_all(&self) -> StorageResult<Vec<ConnectionRow>> {
        self.inner.load_all().await
    }

    async fn upsert(&self, row: ConnectionRow) -> StorageResult<()> {
        if row.canonical_key == self.gated_key {
            self.gate.notified().await;
        }
        self.inner.upsert(row).await
    }

    async fn delete(&self, key: &ConnectionKey) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn count(&self) -> StorageResult<usize> {
        self.inner.count().await
    }
}

fn id(s: &str) -> EntityId {
    EntityId::from(s)
}

fn gated(rows: Vec<ConnectionRow>, a: &str, b: &str) -> (GatedStore, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let store = GatedStore {
        inner: InMemoryConnectionStore::with_rows(rows),
        gated_key: ConnectionKey::new(&id(a), &id(b)).unwrap().to_string(),
        gate: gate.clone(),
    };
    (store, gate)
}

async fn slow_engine() -> Arc<PlasticityEngine> {
    let store = SlowStore {
        inner: InMemoryConnectionStore::new(),
        delay: Duration::from_millis(20),
    };
    Arc::new(
        PlasticityEngine::builder(Arc::new(store))
            .with_seed(3)
            .build()
            .await
            .unwrap(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_successes_on_one_pair_both_apply() {
    let engine = slow_engine().await;

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .update_connection_strength(&InteractionResult::success("a", "b"))
                .await
        })
    };
    let second = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .update_connection_strength(&InteractionResult::success("b", "a"))
                .await
        })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // 0.5 -> 0.55 -> 0.595; a lost update would leave 0.55.
    let strength = engine.strength(&id("a"), &id("b"));
    assert!((strength - 0.595).abs() < 1e-12, "got {strength}");

    let record = engine.connection(&id("a"), &id("b")).unwrap();
    assert_eq!(record.interaction_count, 2);
    assert_eq!(engine.events().total_learned(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_reports_are_all_counted() {
    let engine = slow_engine().await;
    let reports = 40;

    let handles: Vec<_> = (0..reports)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let result = if i % 2 == 0 {
                    InteractionResult::success("x", "y")
                } else {
                    InteractionResult::success("y", "x")
                };
                engine.update_connection_strength(&result).await
            })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let record = engine.connection(&id("x"), &id("y")).unwrap();
    assert_eq!(record.interaction_count, reports);
    assert_eq!(record.success_count, reports);

    // Identical successes commute: s_n = 1 - 0.5 * 0.9^n
    let expected = 1.0 - 0.5 * 0.9f64.powi(reports as i32);
    assert!((record.strength - expected).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_stalled_pair_does_not_block_other_pairs() {
    let (store, gate) = gated(Vec::new(), "a", "b");
    let engine = Arc::new(
        PlasticityEngine::builder(Arc::new(store))
            .build()
            .await
            .unwrap(),
    );

    let stalled = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .update_connection_strength(&InteractionResult::success("a", "b"))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let other = tokio::time::timeout(
        Duration::from_secs(2),
        engine.update_connection_strength(&InteractionResult::success("c", "d")),
    )
    .await
    .expect("unrelated pair should not wait")
    .unwrap();
    assert!((other - 0.55).abs() < 1e-12);

    // The stalled write is not visible until it lands.
    assert!(engine.connection(&id("a"), &id("b")).is_none());

    gate.notify_one();
    let stalled = stalled.await.unwrap().unwrap();
    assert!((stalled - 0.55).abs() < 1e-12);
    assert_eq!(engine.strength(&id("a"), &id("b")), stalled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn prune_spares_a_connection_touched_while_it_waited() {
    let stale = chrono::Utc::now() - chrono::Duration::days(2);
    let key = ConnectionKey::new(&id("a"), &id("b")).unwrap();
    let mut weak = ConnectionRecord::new(key, 0.1, 0.1, 0.01, stale);
    weak.last_interaction_at = Some(stale);

    let (store, gate) = gated(vec![weak.to_row()], "a", "b");
    let engine = Arc::new(
        PlasticityEngine::builder(Arc::new(store))
            .build()
            .await
            .unwrap(),
    );

    // The update holds the pair while its write is gated.
    let update = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .update_connection_strength(&InteractionResult::success("a", "b"))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let prune = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.prune_stale().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.notify_one();

    let strength = update.await.unwrap().unwrap();
    let pruned = prune.await.unwrap().unwrap();

    // Still below the threshold, but no longer stale.
    assert!(strength < 0.2);
    assert_eq!(pruned, 0);
    assert!(engine.connection(&id("a"), &id("b")).is_some());
}
