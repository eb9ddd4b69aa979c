//! Network statistics for monitoring the connection graph.
//!
//! Computes a point-in-time summary from the connection matrix and the event
//! log: population and connection counts, the strength distribution, how
//! densely the population is wired, and recent learning activity.

use crate::events::EventLog;
use crate::matrix::ConnectionMatrix;
use chrono::{DateTime, Utc};
use petgraph::unionfind::UnionFind;
use plexus_core::types::{ConnectionRecord, EntityId};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Aggregate view of the connection network.
///
/// Every field is a finite number, including for an empty network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStatistics {
    /// Known entities, connected or not. The population is rebuilt from
    /// stored connections on load, so this can drop across a restart.
    pub entity_count: usize,
    pub connection_count: usize,
    pub mean_strength: f64,
    /// Population standard deviation of strengths.
    pub strength_std_dev: f64,
    pub min_strength: f64,
    pub max_strength: f64,
    /// Mean success rate over connections with at least one interaction.
    pub mean_success_rate: f64,
    /// connection_count / (entity_count * (entity_count - 1) / 2), over the
    /// same in-process population as `entity_count`.
    pub density: f64,
    /// Connected components, counting isolated entities.
    pub components: usize,
    /// Learning events ever recorded.
    pub total_learning_events: u64,
    /// Prune events ever recorded.
    pub total_prune_events: u64,
    /// Learning events inside the reporting window.
    pub recent_learning_events: usize,
    /// Prune events inside the reporting window.
    pub recent_prune_events: usize,
    pub window_secs: u64,
}

/// Computes [`NetworkStatistics`] from a matrix and its event log.
pub struct StatisticsReporter<'a> {
    matrix: &'a ConnectionMatrix,
    events: &'a EventLog,
}

impl<'a> StatisticsReporter<'a> {
    pub fn new(matrix: &'a ConnectionMatrix, events: &'a EventLog) -> Self {
        Self { matrix, events }
    }

    /// Summarize the network as of `now`, counting events from the last
    /// `window`.
    pub fn snapshot(&self, window: Duration, now: DateTime<Utc>) -> NetworkStatistics {
        let records = self.matrix.records();
        let entities = self.matrix.entities();

        let strengths: Vec<f64> = records.iter().map(|r| r.strength).collect();
        let (mean_strength, strength_std_dev) = mean_and_std_dev(&strengths);
        let min_strength = strengths.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let max_strength = strengths.iter().copied().reduce(f64::max).unwrap_or(0.0);

        let rates: Vec<f64> = records
            .iter()
            .filter(|r| r.interaction_count > 0)
            .map(ConnectionRecord::success_rate)
            .collect();
        let (mean_success_rate, _) = mean_and_std_dev(&rates);

        let since = chrono::Duration::from_std(window)
            .ok()
            .and_then(|w| now.checked_sub_signed(w))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let (recent_learning_events, recent_prune_events) = self.events.counts_since(since);

        NetworkStatistics {
            entity_count: entities.len(),
            connection_count: records.len(),
            mean_strength,
            strength_std_dev,
            min_strength,
            max_strength,
            mean_success_rate,
            density: compute_density(entities.len(), records.len()),
            components: count_components(&entities, &records),
            total_learning_events: self.events.total_learned(),
            total_prune_events: self.events.total_pruned(),
            recent_learning_events,
            recent_prune_events,
            window_secs: window.as_secs(),
        }
    }
}

fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn compute_density(entities: usize, connections: usize) -> f64 {
    let possible = entities.saturating_mul(entities.saturating_sub(1)) / 2;
    if possible == 0 {
        0.0
    } else {
        connections as f64 / possible as f64
    }
}

fn count_components(entities: &[EntityId], records: &[ConnectionRecord]) -> usize {
    let index: HashMap<&EntityId, usize> =
        entities.iter().enumerate().map(|(i, id)| (id, i)).collect();

    let mut sets = UnionFind::<usize>::new(entities.len());
    for record in records {
        let first = index.get(record.key.first());
        let second = index.get(record.key.second());
        if let (Some(&a), Some(&b)) = (first, second) {
            sets.union(a, b);
        }
    }

    let mut roots = sets.into_labeling();
    roots.sort_unstable();
    roots.dedup();
    roots.len()
}
