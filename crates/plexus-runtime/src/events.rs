//! Append-only audit log of plasticity events.
//!
//! The log records what happened to connections (seeding, learning, pruning)
//! for statistics and audit. The update algorithm never reads it back.
//! Capacity is bounded; the oldest events are evicted first.

use chrono::{DateTime, Utc};
use plexus_core::types::{LearningEvent, PruneEvent, SeedEvent};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

/// An event emitted by the plasticity engine.
#[derive(Debug, Clone, Serialize)]
pub enum PlasticityEvent {
    /// A connection was created by population seeding.
    Seeded(SeedEvent),
    /// A connection was reinforced or decayed by an interaction.
    Learned(LearningEvent),
    /// A weak, stale connection was removed.
    Pruned(PruneEvent),
}

impl PlasticityEvent {
    /// When the event happened.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PlasticityEvent::Seeded(e) => e.seeded_at,
            PlasticityEvent::Learned(e) => e.recorded_at,
            PlasticityEvent::Pruned(e) => e.pruned_at,
        }
    }
}

#[derive(Debug, Default)]
struct LogState {
    events: VecDeque<PlasticityEvent>,
    total_learned: u64,
    total_pruned: u64,
    total_seeded: u64,
}

/// Bounded, thread-safe event log.
#[derive(Debug)]
pub struct EventLog {
    state: RwLock<LogState>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(LogState::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn append(&self, event: PlasticityEvent) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match &event {
            PlasticityEvent::Seeded(_) => state.total_seeded += 1,
            PlasticityEvent::Learned(_) => state.total_learned += 1,
            PlasticityEvent::Pruned(_) => state.total_pruned += 1,
        }
        if state.events.len() == self.capacity {
            state.events.pop_front();
        }
        state.events.push_back(event);
    }

    /// Number of events currently retained.
    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Learning events ever appended, including evicted ones.
    pub fn total_learned(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).total_learned
    }

    /// Prune events ever appended, including evicted ones.
    pub fn total_pruned(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).total_pruned
    }

    /// Seed events ever appended, including evicted ones.
    pub fn total_seeded(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).total_seeded
    }

    /// Count retained (learning, prune) events at or after `since`.
    pub fn counts_since(&self, since: DateTime<Utc>) -> (usize, usize) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .events
            .iter()
            .filter(|e| e.occurred_at() >= since)
            .fold((0, 0), |(learned, pruned), e| match e {
                PlasticityEvent::Learned(_) => (learned + 1, pruned),
                PlasticityEvent::Pruned(_) => (learned, pruned + 1),
                PlasticityEvent::Seeded(_) => (learned, pruned),
            })
    }

    /// Copy of the retained events, oldest first.
    pub fn snapshot(&self) -> Vec<PlasticityEvent> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .iter()
            .cloned()
            .collect()
    }
}
