//! Engine configuration.
//!
//! Every tunable of the plasticity engine lives here so that nothing in the
//! update, pruning, or suggestion paths is a hardcoded constant. All fields
//! are defaulted, so partial TOML/JSON documents deserialize cleanly.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Floor and ceiling every connection strength is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for StrengthBounds {
    fn default() -> Self {
        Self { min: 0.01, max: 1.0 }
    }
}

impl StrengthBounds {
    /// Clamp `value` into the bounds. NaN collapses to the floor.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Configuration for the plasticity engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasticityConfig {
    /// Strength floor and ceiling (default: 0.01-1.0).
    pub bounds: StrengthBounds,
    /// Strength assumed for a pair with no record (default: 0.5).
    pub default_strength: f64,
    /// Learning rate given to new connections (default: 0.1).
    pub learning_rate: f64,
    /// Decay rate given to new connections (default: 0.01).
    pub decay_rate: f64,
    /// How far compatibility swings the seeded strength around 0.5 (default: 0.4).
    pub seed_spread: f64,
    /// Standard deviation of the Gaussian seeding jitter (default: 0.05).
    pub seed_jitter_sigma: f64,
    /// Lowest strength a seeded connection can start at (default: 0.1).
    pub seed_floor: f64,
    /// Highest strength a seeded connection can start at (default: 0.9).
    pub seed_ceiling: f64,
    /// Connections weaker than this are pruning candidates (default: 0.2).
    pub prune_threshold: f64,
    /// Idle time before a weak connection may be pruned (default: 24h).
    pub staleness_window_secs: u64,
    /// Weight of connection strength in suggestion scores (default: 0.7).
    pub strength_weight: f64,
    /// Weight of the recency boost in suggestion scores (default: 0.3).
    pub recency_weight: f64,
    /// Largest recency boost a pair can earn (default: 0.3).
    pub recency_cap: f64,
    /// Idle time at which the recency boost reaches its cap (default: 24h).
    pub recency_horizon_secs: u64,
    /// Half-width of the uniform exploration noise in suggestions (default: 0.05).
    pub suggestion_jitter: f64,
    /// Timeout for each store operation (default: 5000ms).
    pub store_timeout_ms: u64,
    /// Window for "recent" event counts in statistics (default: 1h).
    pub stats_window_secs: u64,
    /// Maximum number of events kept in the audit log (default: 10000).
    pub event_log_capacity: usize,
}

impl Default for PlasticityConfig {
    fn default() -> Self {
        Self {
            bounds: StrengthBounds::default(),
            default_strength: 0.5,
            learning_rate: 0.1,
            decay_rate: 0.01,
            seed_spread: 0.4,
            seed_jitter_sigma: 0.05,
            seed_floor: 0.1,
            seed_ceiling: 0.9,
            prune_threshold: 0.2,
            staleness_window_secs: 24 * 60 * 60,
            strength_weight: 0.7,
            recency_weight: 0.3,
            recency_cap: 0.3,
            recency_horizon_secs: 24 * 60 * 60,
            suggestion_jitter: 0.05,
            store_timeout_ms: 5000,
            stats_window_secs: 60 * 60,
            event_log_capacity: 10_000,
        }
    }
}

impl PlasticityConfig {
    pub fn staleness_window(&self) -> Duration {
        Duration::from_secs(self.staleness_window_secs)
    }

    pub fn recency_horizon(&self) -> Duration {
        Duration::from_secs(self.recency_horizon_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn stats_window(&self) -> Duration {
        Duration::from_secs(self.stats_window_secs)
    }

    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let StrengthBounds { min, max } = self.bounds;
        if !(min.is_finite() && max.is_finite() && 0.0 <= min && min < max && max <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "bounds",
                reason: format!("need 0 <= min < max <= 1, got [{min}, {max}]"),
            });
        }

        in_range("default_strength", self.default_strength, min, max)?;
        rate("learning_rate", self.learning_rate)?;
        rate("decay_rate", self.decay_rate)?;
        in_range("seed_spread", self.seed_spread, 0.0, 1.0)?;
        in_range("seed_jitter_sigma", self.seed_jitter_sigma, 0.0, 1.0)?;
        in_range("seed_floor", self.seed_floor, 0.0, 1.0)?;
        in_range("seed_ceiling", self.seed_ceiling, self.seed_floor, 1.0)?;
        in_range("prune_threshold", self.prune_threshold, 0.0, 1.0)?;
        in_range("strength_weight", self.strength_weight, 0.0, 1.0)?;
        in_range("recency_weight", self.recency_weight, 0.0, 1.0)?;
        in_range("recency_cap", self.recency_cap, 0.0, 1.0)?;
        in_range("suggestion_jitter", self.suggestion_jitter, 0.0, 1.0)?;

        if self.recency_horizon_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recency_horizon_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.event_log_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_log_capacity",
                reason: "must hold at least one event".to_string(),
            });
        }
        Ok(())
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, min, max, value })
    }
}

fn rate(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} is outside (0, 1]"),
        })
    }
}
