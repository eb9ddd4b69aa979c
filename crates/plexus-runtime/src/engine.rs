//! PlasticityEngine: applies the Hebbian learning rule to the connection
//! matrix.
//!
//! Successful interactions pull a connection towards the upper bound with a
//! saturating increment; failed ones decay it multiplicatively. Weak,
//! long-idle connections are pruned. Updates to the same pair are
//! linearized through the matrix's key lock, so concurrent reports are never
//! lost; updates to different pairs proceed in parallel.
//!
//! The engine is cheap to share behind an `Arc` and every operation takes
//! `&self`.

use crate::events::{EventLog, PlasticityEvent};
use crate::matrix::{ConnectionMatrix, StrengthUpdate};
use crate::stats::{NetworkStatistics, StatisticsReporter};
use chrono::{DateTime, Utc};
use plexus_core::config::PlasticityConfig;
use plexus_core::error::{ConfigError, PlasticityError, PlasticityResult};
use plexus_core::store::ConnectionStore;
use plexus_core::types::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Builder for [`PlasticityEngine`].
///
/// ```rust
/// use std::sync::Arc;
/// use plexus_core::prelude::*;
/// use plexus_runtime::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), PlasticityError> {
///     let engine = PlasticityEngine::builder(Arc::new(InMemoryConnectionStore::new()))
///         .with_seed(7)
///         .build()
///         .await?;
///
///     let strength = engine
///         .update_connection_strength(&InteractionResult::success("alice", "bob"))
///         .await?;
///     assert!((strength - 0.55).abs() < 1e-9);
///     Ok(())
/// }
/// ```
pub struct EngineBuilder {
    store: Arc<dyn ConnectionStore>,
    config: PlasticityConfig,
    rng: Option<ChaCha8Rng>,
}

impl EngineBuilder {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self {
            store,
            config: PlasticityConfig::default(),
            rng: None,
        }
    }

    pub fn with_config(mut self, config: PlasticityConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the engine's random source for reproducible seeding and
    /// suggestion jitter.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(ChaCha8Rng::seed_from_u64(seed));
        self
    }

    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Validate the configuration, load every persisted connection and
    /// return a ready engine.
    pub async fn build(self) -> PlasticityResult<PlasticityEngine> {
        self.config.validate()?;
        let seed_noise = Normal::new(0.0, self.config.seed_jitter_sigma).map_err(|e| {
            ConfigError::InvalidValue {
                field: "seed_jitter_sigma",
                reason: e.to_string(),
            }
        })?;

        let matrix = ConnectionMatrix::new(self.store, &self.config);
        matrix.load_from_store(self.config.store_timeout()).await?;

        let rng = self.rng.unwrap_or_else(ChaCha8Rng::from_entropy);
        Ok(PlasticityEngine {
            events: EventLog::new(self.config.event_log_capacity),
            matrix,
            config: self.config,
            rng: Mutex::new(rng),
            seed_noise,
        })
    }
}

/// The adaptive connection engine.
pub struct PlasticityEngine {
    matrix: ConnectionMatrix,
    events: EventLog,
    config: PlasticityConfig,
    rng: Mutex<ChaCha8Rng>,
    seed_noise: Normal<f64>,
}

impl PlasticityEngine {
    pub fn builder(store: Arc<dyn ConnectionStore>) -> EngineBuilder {
        EngineBuilder::new(store)
    }

    pub fn config(&self) -> &PlasticityConfig {
        &self.config
    }

    /// Read-only view of the connection matrix.
    pub fn matrix(&self) -> &ConnectionMatrix {
        &self.matrix
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    fn rng(&self) -> MutexGuard<'_, ChaCha8Rng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current strength of a pair (neutral default when unknown).
    pub fn strength(&self, a: &EntityId, b: &EntityId) -> f64 {
        self.matrix.get_strength(a, b)
    }

    pub fn connection(&self, a: &EntityId, b: &EntityId) -> Option<ConnectionRecord> {
        self.matrix.get(a, b)
    }

    pub fn strongest_connections(&self, entity: &EntityId, limit: usize) -> Vec<(EntityId, f64)> {
        self.matrix.strongest_connections(entity, limit)
    }

    /// Add an entity to the population without creating connections.
    /// Returns false if it was already known.
    ///
    /// Registration lives in memory only. A store holds connections, so an
    /// entity that never gets one is forgotten on restart; re-register it
    /// after [`EngineBuilder::build`] if it should count towards statistics
    /// and suggestions.
    pub fn register_entity(&self, id: impl Into<EntityId>) -> PlasticityResult<bool> {
        let id = id.into();
        if id.is_empty() {
            return Err(PlasticityError::invalid_key("entity id must not be empty"));
        }
        Ok(self.matrix.register_entity(id))
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    /// Starting strength for a new pair with the given compatibility.
    ///
    /// Compatibility (clamped to `[0, 1]`) moves the base away from 0.5 by
    /// `seed_spread`; Gaussian jitter is added and the result is clamped to
    /// `[seed_floor, seed_ceiling]`.
    pub fn initial_seed(&self, a: &EntityId, b: &EntityId, compatibility: f64) -> f64 {
        let compatibility = clamp_unit(compatibility);
        let base = 0.5 + (compatibility - 0.5) * self.config.seed_spread;
        let jitter = self.seed_noise.sample(&mut *self.rng());
        let seeded = self
            .matrix
            .bounds()
            .clamp((base + jitter).clamp(self.config.seed_floor, self.config.seed_ceiling));

        debug!(%a, %b, compatibility, seeded, "Seeded strength");
        seeded
    }

    /// Create a connection for every unordered pair in `population` that does
    /// not have one yet. Existing connections are left as they are.
    ///
    /// Pairs are visited in id order, so a seeded engine produces the same
    /// strengths for the same population. Returns the number created.
    pub async fn initialize_connections<F>(
        &self,
        population: &[EntityId],
        compatibility: F,
    ) -> PlasticityResult<usize>
    where
        F: Fn(&EntityId, &EntityId) -> f64,
    {
        self.initialize_connections_with_timeout(
            population,
            compatibility,
            self.config.store_timeout(),
        )
        .await
    }

    /// [`Self::initialize_connections`] with an explicit per-write store
    /// timeout. Pairs created before a failed write stay in place.
    pub async fn initialize_connections_with_timeout<F>(
        &self,
        population: &[EntityId],
        compatibility: F,
        timeout: Duration,
    ) -> PlasticityResult<usize>
    where
        F: Fn(&EntityId, &EntityId) -> f64,
    {
        if population.iter().any(EntityId::is_empty) {
            return Err(PlasticityError::invalid_key("entity id must not be empty"));
        }

        let mut members: Vec<&EntityId> = population.iter().collect();
        members.sort();
        members.dedup();
        for &id in &members {
            self.matrix.register_entity(id.clone());
        }

        let mut created = 0usize;
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                let key = ConnectionKey::new(a, b)?;
                let _guard = self.matrix.lock(&key).await;
                if self.matrix.contains(&key) {
                    continue;
                }

                let score = clamp_unit(compatibility(a, b));
                let strength = self.initial_seed(a, b, score);
                let now = Utc::now();
                let record = ConnectionRecord::new(
                    key.clone(),
                    strength,
                    self.config.learning_rate,
                    self.config.decay_rate,
                    now,
                );
                let record = self.matrix.insert(record, timeout).await?;

                self.events.append(PlasticityEvent::Seeded(SeedEvent {
                    key,
                    strength: record.strength,
                    compatibility: score,
                    seeded_at: now,
                }));
                created += 1;
            }
        }

        info!(
            population = members.len(),
            created,
            "Initialized connections"
        );
        Ok(created)
    }

    // ------------------------------------------------------------------
    // Learning
    // ------------------------------------------------------------------

    /// Apply one interaction outcome to its pair and return the new strength.
    ///
    /// Uses the configured store timeout. On error the connection is left
    /// exactly as it was.
    pub async fn update_connection_strength(
        &self,
        result: &InteractionResult,
    ) -> PlasticityResult<f64> {
        self.update_connection_strength_with_timeout(result, self.config.store_timeout())
            .await
    }

    /// [`update_connection_strength`](Self::update_connection_strength) with
    /// an explicit store timeout.
    pub async fn update_connection_strength_with_timeout(
        &self,
        result: &InteractionResult,
        timeout: Duration,
    ) -> PlasticityResult<f64> {
        let key = result.key()?;
        let _guard = self.matrix.lock(&key).await;

        let current = self.matrix.record(&key);
        let (old, learning_rate, decay_rate) = match &current {
            Some(r) => (r.strength, r.learning_rate, r.decay_rate),
            None => (
                self.matrix.default_strength(),
                self.config.learning_rate,
                self.config.decay_rate,
            ),
        };
        let next = self.next_strength(old, learning_rate, decay_rate, result);

        let update = StrengthUpdate {
            strength: next,
            at: result.timestamp,
            outcome: Some(result.success),
        };
        let record = self.matrix.set_strength(&key, update, timeout).await?;

        self.events.append(PlasticityEvent::Learned(LearningEvent {
            key: key.clone(),
            old_strength: old,
            new_strength: record.strength,
            result: result.clone(),
            recorded_at: Utc::now(),
        }));

        debug!(
            key = %key,
            success = result.success,
            old,
            new = record.strength,
            "Connection updated"
        );
        Ok(record.strength)
    }

    /// The Hebbian rule: saturating growth on success, proportional decay on
    /// failure, clamped into bounds.
    fn next_strength(
        &self,
        old: f64,
        learning_rate: f64,
        decay_rate: f64,
        result: &InteractionResult,
    ) -> f64 {
        let bounds = self.matrix.bounds();
        let factor = result.factor();
        let raw = if result.success {
            old + learning_rate * factor * result.gain() * (bounds.max - old)
        } else {
            old - decay_rate * (1.0 - factor) * old
        };
        bounds.clamp(raw)
    }

    // ------------------------------------------------------------------
    // Pruning
    // ------------------------------------------------------------------

    /// Remove every connection with `strength < threshold` whose last
    /// activity is older than `staleness_window`.
    ///
    /// Each candidate is re-checked under its key lock right before removal;
    /// one that was reinforced or touched in the meantime survives. If the
    /// store fails part-way, [`PlasticityError::PartialPrune`] reports how
    /// many connections were already removed.
    pub async fn prune_connections(
        &self,
        threshold: f64,
        staleness_window: Duration,
    ) -> PlasticityResult<usize> {
        self.prune_connections_with_timeout(
            threshold,
            staleness_window,
            self.config.store_timeout(),
        )
        .await
    }

    /// [`Self::prune_connections`] with an explicit per-delete store timeout.
    pub async fn prune_connections_with_timeout(
        &self,
        threshold: f64,
        staleness_window: Duration,
        timeout: Duration,
    ) -> PlasticityResult<usize> {
        let candidates = self.matrix.below_threshold(threshold);
        let candidate_count = candidates.len();
        let mut pruned = 0usize;

        for candidate in candidates {
            let key = candidate.key;
            let _guard = self.matrix.lock(&key).await;

            let Some(current) = self.matrix.record(&key) else {
                continue;
            };
            let now = Utc::now();
            if current.strength >= threshold
                || idle_for(current.last_activity(), now) <= staleness_window
            {
                debug!(key = %key, "Prune candidate changed, keeping");
                continue;
            }

            match self.matrix.remove(&key, timeout).await {
                Ok(_) => {}
                Err(PlasticityError::Storage(source)) => {
                    warn!(key = %key, pruned, "Pruning interrupted: {}", source);
                    return Err(PlasticityError::PartialPrune { pruned, source });
                }
                Err(other) => return Err(other),
            }
            pruned += 1;

            self.events.append(PlasticityEvent::Pruned(PruneEvent {
                key,
                final_strength: current.strength,
                interaction_count: current.interaction_count,
                age: idle_for(current.created_at, now),
                pruned_at: now,
            }));
        }

        info!(
            pruned,
            candidates = candidate_count,
            threshold,
            "Pruning pass complete"
        );
        Ok(pruned)
    }

    /// Prune with the configured threshold and staleness window.
    pub async fn prune_stale(&self) -> PlasticityResult<usize> {
        self.prune_connections(self.config.prune_threshold, self.config.staleness_window())
            .await
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Rank every other known entity as an interaction partner for `entity`.
    ///
    /// `score = strength_weight * strength + recency_weight * recency_boost + jitter`,
    /// where the boost grows with time since the pair last interacted and
    /// pairs that never interacted get the full boost. Returns at most `k`
    /// partners, best first.
    pub fn suggest_interactions(&self, entity: &EntityId, k: usize) -> Vec<(EntityId, f64)> {
        let now = Utc::now();
        let jitter = self.config.suggestion_jitter;
        let mut rng = self.rng();

        let mut scored: Vec<(EntityId, f64)> = self
            .matrix
            .entities()
            .into_iter()
            .filter(|peer| peer != entity)
            .map(|peer| {
                let record = self.matrix.get(entity, &peer);
                let strength = record
                    .as_ref()
                    .map_or(self.matrix.default_strength(), |r| r.strength);
                let boost = self.recency_boost(record.and_then(|r| r.last_interaction_at), now);
                let noise = if jitter > 0.0 {
                    rng.gen_range(-jitter..=jitter)
                } else {
                    0.0
                };
                let score = self.config.strength_weight * strength
                    + self.config.recency_weight * boost
                    + noise;
                (peer, score)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored
    }

    fn recency_boost(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let cap = self.config.recency_cap;
        match last {
            None => cap,
            Some(at) => {
                let horizon = self.config.recency_horizon().as_secs_f64();
                let idle = idle_for(at, now).as_secs_f64();
                cap * (idle / horizon).min(1.0)
            }
        }
    }

    /// Aggregate view of the network over the configured stats window.
    pub fn network_statistics(&self) -> NetworkStatistics {
        StatisticsReporter::new(&self.matrix, &self.events)
            .snapshot(self.config.stats_window(), Utc::now())
    }
}

/// Time elapsed from `since` to `now`; zero if `since` is in the future.
fn idle_for(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryConnectionStore;
    use chrono::Duration as ChronoDuration;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    async fn engine_with(config: PlasticityConfig, rows: Vec<ConnectionRow>) -> PlasticityEngine {
        PlasticityEngine::builder(Arc::new(InMemoryConnectionStore::with_rows(rows)))
            .with_config(config)
            .with_seed(42)
            .build()
            .await
            .unwrap()
    }

    async fn engine() -> PlasticityEngine {
        engine_with(PlasticityConfig::default(), Vec::new()).await
    }

    fn row(a: &str, b: &str, strength: f64, last: Option<DateTime<Utc>>) -> ConnectionRow {
        let key = ConnectionKey::new(&id(a), &id(b)).unwrap();
        let created = last.unwrap_or_else(Utc::now);
        let mut record = ConnectionRecord::new(key, strength, 0.1, 0.01, created);
        record.last_interaction_at = last;
        record.to_row()
    }

    #[tokio::test]
    async fn first_success_reinforces_from_neutral() {
        let engine = engine().await;
        let s = engine
            .update_connection_strength(&InteractionResult::success("alice", "bob"))
            .await
            .unwrap();

        assert!((s - 0.55).abs() < 1e-12);
        let record = engine.connection(&id("bob"), &id("alice")).unwrap();
        assert_eq!(record.interaction_count, 1);
        assert_eq!(record.success_count, 1);
    }

    #[tokio::test]
    async fn failure_with_partial_factor_decays() {
        let engine = engine_with(
            PlasticityConfig::default(),
            vec![row("alice", "bob", 0.3, Some(Utc::now()))],
        )
        .await;

        let partial = InteractionResult::failure("alice", "bob").with_factor(0.0);
        let s = engine.update_connection_strength(&partial).await.unwrap();
        assert!((s - 0.297).abs() < 1e-12);

        let partial = InteractionResult::failure("alice", "bob").with_factor(0.5);
        let s = engine.update_connection_strength(&partial).await.unwrap();
        assert!((s - (0.297 - 0.01 * 0.5 * 0.297)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn success_never_decreases_and_failure_never_increases() {
        let engine = engine().await;
        let mut last = engine.strength(&id("a"), &id("b"));
        for i in 0..50 {
            let success = i % 3 != 0;
            let result = InteractionResult::new("a", "b", success).with_factor(0.3);
            let next = engine.update_connection_strength(&result).await.unwrap();
            if success {
                assert!(next >= last);
            } else {
                assert!(next <= last);
            }
            assert!((0.01..=1.0).contains(&next));
            last = next;
        }
    }

    #[tokio::test]
    async fn repeated_failures_settle_on_the_floor() {
        let engine = engine().await;
        let mut last = engine.strength(&id("a"), &id("b"));
        for _ in 0..2000 {
            let next = engine
                .update_connection_strength(&InteractionResult::failure("a", "b"))
                .await
                .unwrap();
            assert!(next <= last);
            last = next;
        }
        assert_eq!(last, 0.01);
    }

    #[tokio::test]
    async fn repeated_successes_approach_but_never_reach_the_ceiling() {
        let engine = engine().await;
        let mut last = engine.strength(&id("a"), &id("b"));
        for _ in 0..2000 {
            let next = engine
                .update_connection_strength(&InteractionResult::success("a", "b"))
                .await
                .unwrap();
            assert!(next >= last);
            assert!(next < 1.0);
            last = next;
        }
        assert!(last > 0.999_999);
    }

    #[tokio::test]
    async fn out_of_range_factors_are_clamped() {
        let engine = engine().await;
        let s = engine
            .update_connection_strength(
                &InteractionResult::success("a", "b").with_factor(9.0).with_gain(-3.0),
            )
            .await
            .unwrap();
        // gain clamps to 0, so nothing is learned
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn self_pair_is_rejected_without_side_effects() {
        let engine = engine().await;
        let err = engine
            .update_connection_strength(&InteractionResult::success("a", "a"))
            .await
            .unwrap_err();

        assert!(matches!(err, PlasticityError::InvalidKey(_)));
        assert!(engine.matrix().is_empty());
        assert!(engine.events().is_empty());
    }

    #[tokio::test]
    async fn seeds_stay_in_range_and_follow_compatibility() {
        let engine = engine().await;
        let (a, b) = (id("a"), id("b"));

        for _ in 0..200 {
            let low = engine.initial_seed(&a, &b, 0.0);
            let high = engine.initial_seed(&a, &b, 1.0);
            assert!((0.1..=0.9).contains(&low));
            assert!((0.1..=0.9).contains(&high));
        }

        let mut config = PlasticityConfig::default();
        config.seed_jitter_sigma = 0.0;
        let quiet = engine_with(config, Vec::new()).await;
        assert!((quiet.initial_seed(&a, &b, 1.0) - 0.7).abs() < 1e-12);
        assert!((quiet.initial_seed(&a, &b, 0.0) - 0.3).abs() < 1e-12);
        assert!((quiet.initial_seed(&a, &b, 7.0) - 0.7).abs() < 1e-12);
    }

    #[tokio::test]
    async fn seeding_is_reproducible_with_a_fixed_seed() {
        let population: Vec<EntityId> = ["d", "a", "c", "b"].into_iter().map(id).collect();

        let first = engine().await;
        let second = engine().await;
        first.initialize_connections(&population, |_, _| 0.6).await.unwrap();
        second.initialize_connections(&population, |_, _| 0.6).await.unwrap();

        let strengths = |e: &PlasticityEngine| -> Vec<f64> {
            e.matrix().records().iter().map(|r| r.strength).collect()
        };
        assert_eq!(strengths(&first), strengths(&second));
    }

    #[tokio::test]
    async fn initialize_connections_skips_existing_pairs() {
        let engine = engine_with(
            PlasticityConfig::default(),
            vec![row("a", "b", 0.95, None)],
        )
        .await;
        let population: Vec<EntityId> = ["a", "b", "c", "a"].into_iter().map(id).collect();

        let created = engine
            .initialize_connections(&population, |_, _| 0.5)
            .await
            .unwrap();

        assert_eq!(created, 2);
        assert_eq!(engine.matrix().len(), 3);
        assert_eq!(engine.strength(&id("a"), &id("b")), 0.95);
        assert_eq!(engine.events().total_seeded(), 2);
    }

    #[tokio::test]
    async fn initialize_rejects_empty_ids() {
        let engine = engine().await;
        let population = vec![id("a"), id("")];
        assert!(engine
            .initialize_connections(&population, |_, _| 0.5)
            .await
            .is_err());
        assert_eq!(engine.matrix().entity_count(), 0);
    }

    #[tokio::test]
    async fn prune_removes_only_weak_and_stale() {
        let old = Utc::now() - ChronoDuration::hours(48);
        let engine = engine_with(
            PlasticityConfig::default(),
            vec![
                row("a", "weak-stale", 0.1, Some(old)),
                row("a", "weak-fresh", 0.1, Some(Utc::now())),
                row("a", "strong-stale", 0.8, Some(old)),
                row("a", "at-threshold", 0.2, Some(old)),
            ],
        )
        .await;

        let pruned = engine.prune_stale().await.unwrap();

        assert_eq!(pruned, 1);
        assert!(engine.connection(&id("a"), &id("weak-stale")).is_none());
        assert_eq!(engine.matrix().len(), 3);
        assert_eq!(engine.events().total_pruned(), 1);
    }

    #[tokio::test]
    async fn never_interacted_pairs_age_from_creation() {
        let old = Utc::now() - ChronoDuration::days(3);
        let key = ConnectionKey::new(&id("a"), &id("b")).unwrap();
        let seeded = ConnectionRecord::new(key, 0.1, 0.1, 0.01, old);
        let engine = engine_with(PlasticityConfig::default(), vec![seeded.to_row()]).await;

        assert_eq!(engine.prune_stale().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn suggestions_exclude_self_and_respect_k() {
        let mut config = PlasticityConfig::default();
        config.suggestion_jitter = 0.0;
        let now = Utc::now();
        let engine = engine_with(
            config,
            vec![
                row("me", "close", 0.9, Some(now)),
                row("me", "weak", 0.1, Some(now)),
            ],
        )
        .await;
        engine.register_entity("stranger").unwrap();

        let suggestions = engine.suggest_interactions(&id("me"), 10);
        let names: Vec<&str> = suggestions.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["close", "stranger", "weak"]);

        // stranger: 0.7 * 0.5 + 0.3 * 0.3
        assert!((suggestions[1].1 - 0.44).abs() < 1e-9);
        assert_eq!(engine.suggest_interactions(&id("me"), 1).len(), 1);
        assert!(engine.suggest_interactions(&id("me"), 0).is_empty());
    }

    #[tokio::test]
    async fn recency_boost_grows_with_idle_time() {
        let engine = engine().await;
        let now = Utc::now();

        assert_eq!(engine.recency_boost(None, now), 0.3);
        assert_eq!(engine.recency_boost(Some(now), now), 0.0);
        let half = engine.recency_boost(Some(now - ChronoDuration::hours(12)), now);
        assert!((half - 0.15).abs() < 1e-9);
        assert_eq!(engine.recency_boost(Some(now - ChronoDuration::days(9)), now), 0.3);
    }

    #[tokio::test]
    async fn build_rejects_invalid_config() {
        let mut config = PlasticityConfig::default();
        config.learning_rate = 0.0;
        let result = PlasticityEngine::builder(Arc::new(InMemoryConnectionStore::new()))
            .with_config(config)
            .build()
            .await;
        assert!(matches!(result, Err(PlasticityError::Config(_))));
    }

    #[tokio::test]
    async fn register_entity_reports_novelty() {
        let engine = engine().await;
        assert!(engine.register_entity("a").unwrap());
        assert!(!engine.register_entity("a").unwrap());
        assert!(engine.register_entity("").is_err());
    }
}
