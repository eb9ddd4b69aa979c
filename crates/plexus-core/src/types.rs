//! Shared types used across all Plexus crates.

use crate::config::StrengthBounds;
use crate::error::{PlasticityError, PlasticityResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of an entity (agent) taking part in interactions.
///
/// Ordering is lexicographic on the underlying string, which is what
/// canonical keys and deterministic tie-breaks rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical key of an unordered entity pair.
///
/// The smaller id (lexicographically) is always stored first, so
/// `ConnectionKey::new(a, b) == ConnectionKey::new(b, a)`. The text form is
/// `<byte length of first>:<first><second>`, which stays unambiguous whatever
/// characters the ids contain.
///
/// Serializes as that text form, so a deserialized key is always canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionKey {
    first: EntityId,
    second: EntityId,
}

impl ConnectionKey {
    /// Build the canonical key for a pair. Rejects empty ids and self-pairs.
    pub fn new(a: &EntityId, b: &EntityId) -> PlasticityResult<Self> {
        if a.is_empty() || b.is_empty() {
            return Err(PlasticityError::invalid_key("entity id must not be empty"));
        }
        if a == b {
            return Err(PlasticityError::invalid_key(format!(
                "self-referential pair ({a}, {b})"
            )));
        }

        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Ok(Self {
            first: first.clone(),
            second: second.clone(),
        })
    }

    pub fn first(&self) -> &EntityId {
        &self.first
    }

    pub fn second(&self) -> &EntityId {
        &self.second
    }

    /// Whether `id` is one of the two endpoints.
    pub fn contains(&self, id: &EntityId) -> bool {
        &self.first == id || &self.second == id
    }

    /// The other endpoint, if `id` is part of this pair.
    pub fn peer_of(&self, id: &EntityId) -> Option<&EntityId> {
        if &self.first == id {
            Some(&self.second)
        } else if &self.second == id {
            Some(&self.first)
        } else {
            None
        }
    }

    /// Parse the canonical text form produced by `Display`.
    pub fn parse(text: &str) -> PlasticityResult<Self> {
        let (len, rest) = text.split_once(':').ok_or_else(|| {
            PlasticityError::invalid_key(format!("missing length prefix in '{text}'"))
        })?;
        let len: usize = len
            .parse()
            .map_err(|_| PlasticityError::invalid_key(format!("bad length prefix in '{text}'")))?;
        if len > rest.len() || !rest.is_char_boundary(len) {
            return Err(PlasticityError::invalid_key(format!(
                "length prefix {len} does not split '{rest}'"
            )));
        }

        let (a, b) = rest.split_at(len);
        let key = Self::new(&EntityId::from(a), &EntityId::from(b))?;
        if key.first.as_str() != a {
            return Err(PlasticityError::invalid_key(format!(
                "'{text}' is not in canonical order"
            )));
        }
        Ok(key)
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.first.0.len(), self.first, self.second)
    }
}

impl FromStr for ConnectionKey {
    type Err = PlasticityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ConnectionKey {
    type Error = PlasticityError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text)
    }
}

impl From<ConnectionKey> for String {
    fn from(key: ConnectionKey) -> Self {
        key.to_string()
    }
}

/// Clamp a caller-supplied factor into `[0, 1]`. NaN counts as 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// In-memory state of one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub key: ConnectionKey,
    /// Always within the engine's strength bounds.
    pub strength: f64,
    pub interaction_count: u64,
    /// Never exceeds `interaction_count`.
    pub success_count: u64,
    /// `None` until the first reported interaction.
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub learning_rate: f64,
    pub decay_rate: f64,
}

impl ConnectionRecord {
    pub fn new(
        key: ConnectionKey,
        strength: f64,
        learning_rate: f64,
        decay_rate: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            strength,
            interaction_count: 0,
            success_count: 0,
            last_interaction_at: None,
            created_at,
            learning_rate,
            decay_rate,
        }
    }

    /// Fraction of interactions that succeeded (0 when there were none).
    pub fn success_rate(&self) -> f64 {
        if self.interaction_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.interaction_count as f64
        }
    }

    /// Last time anything happened to this connection.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_interaction_at.unwrap_or(self.created_at)
    }

    pub fn involves(&self, id: &EntityId) -> bool {
        self.key.contains(id)
    }

    pub fn peer_of(&self, id: &EntityId) -> Option<&EntityId> {
        self.key.peer_of(id)
    }

    /// Convert to the persisted row shape.
    pub fn to_row(&self) -> ConnectionRow {
        ConnectionRow {
            canonical_key: self.key.to_string(),
            entity_a: self.key.first().to_string(),
            entity_b: self.key.second().to_string(),
            strength: self.strength,
            interaction_count: self.interaction_count,
            success_count: self.success_count,
            last_interaction_at: self.last_interaction_at,
            created_at: self.created_at,
            learning_rate: self.learning_rate,
            decay_rate: self.decay_rate,
        }
    }
}

/// Persisted shape of a connection, as stores read and write it.
///
/// Rows coming back from a store are untrusted until validated with
/// [`ConnectionRow::into_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRow {
    pub canonical_key: String,
    pub entity_a: String,
    pub entity_b: String,
    pub strength: f64,
    pub interaction_count: u64,
    pub success_count: u64,
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub learning_rate: f64,
    pub decay_rate: f64,
}

impl ConnectionRow {
    /// Validate this row against `bounds` and turn it into a record.
    pub fn into_record(self, bounds: &StrengthBounds) -> PlasticityResult<ConnectionRecord> {
        let key = ConnectionKey::parse(&self.canonical_key)?;
        let malformed = |reason: String| PlasticityError::MalformedRecord {
            key: self.canonical_key.clone(),
            reason,
        };

        if key.first().as_str() != self.entity_a || key.second().as_str() != self.entity_b {
            return Err(malformed(format!(
                "endpoints ({}, {}) do not match the key",
                self.entity_a, self.entity_b
            )));
        }
        if !bounds.contains(self.strength) {
            return Err(malformed(format!(
                "strength {} outside [{}, {}]",
                self.strength, bounds.min, bounds.max
            )));
        }
        if self.success_count > self.interaction_count {
            return Err(malformed(format!(
                "success_count {} exceeds interaction_count {}",
                self.success_count, self.interaction_count
            )));
        }
        let rates = [
            ("learning_rate", self.learning_rate),
            ("decay_rate", self.decay_rate),
        ];
        for (name, rate) in rates {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(malformed(format!("{name} {rate} outside (0, 1]")));
            }
        }

        Ok(ConnectionRecord {
            key,
            strength: self.strength,
            interaction_count: self.interaction_count,
            success_count: self.success_count,
            last_interaction_at: self.last_interaction_at,
            created_at: self.created_at,
            learning_rate: self.learning_rate,
            decay_rate: self.decay_rate,
        })
    }
}

/// The kind of interaction that produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    /// Question/answer exchange between two agents.
    Dialogue,
    /// Joint work towards a shared goal.
    Collaboration,
    /// Trade of information or resources.
    Exchange,
    /// Custom interaction type for domain-specific use.
    Custom(String),
}

/// Outcome of one interaction between two entities, reported by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResult {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub success: bool,
    /// How well the interaction went, 0.0-1.0.
    pub success_factor: f64,
    /// How much was learned, 0.0-1.0.
    pub learning_gain: f64,
    pub kind: InteractionKind,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl InteractionResult {
    pub fn new(
        entity_a: impl Into<EntityId>,
        entity_b: impl Into<EntityId>,
        success: bool,
    ) -> Self {
        Self {
            entity_a: entity_a.into(),
            entity_b: entity_b.into(),
            success,
            success_factor: if success { 1.0 } else { 0.0 },
            learning_gain: 1.0,
            kind: InteractionKind::Dialogue,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// A fully successful interaction (factor 1.0, gain 1.0).
    pub fn success(entity_a: impl Into<EntityId>, entity_b: impl Into<EntityId>) -> Self {
        Self::new(entity_a, entity_b, true)
    }

    /// A complete failure (factor 0.0).
    pub fn failure(entity_a: impl Into<EntityId>, entity_b: impl Into<EntityId>) -> Self {
        Self::new(entity_a, entity_b, false)
    }

    pub fn with_factor(mut self, success_factor: f64) -> Self {
        self.success_factor = success_factor;
        self
    }

    pub fn with_gain(mut self, learning_gain: f64) -> Self {
        self.learning_gain = learning_gain;
        self
    }

    pub fn with_kind(mut self, kind: InteractionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Canonical key of the pair, or `InvalidKey` for a self-pair.
    pub fn key(&self) -> PlasticityResult<ConnectionKey> {
        ConnectionKey::new(&self.entity_a, &self.entity_b)
    }

    /// `success_factor` clamped into `[0, 1]`.
    pub fn factor(&self) -> f64 {
        clamp_unit(self.success_factor)
    }

    /// `learning_gain` clamped into `[0, 1]`.
    pub fn gain(&self) -> f64 {
        clamp_unit(self.learning_gain)
    }
}

/// Audit entry for one reinforcement/decay step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    pub key: ConnectionKey,
    pub old_strength: f64,
    pub new_strength: f64,
    pub result: InteractionResult,
    pub recorded_at: DateTime<Utc>,
}

impl LearningEvent {
    pub fn delta(&self) -> f64 {
        self.new_strength - self.old_strength
    }
}

/// Final snapshot of a connection removed by pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneEvent {
    pub key: ConnectionKey,
    pub final_strength: f64,
    pub interaction_count: u64,
    /// Time between creation and removal.
    pub age: std::time::Duration,
    pub pruned_at: DateTime<Utc>,
}

/// A connection created by bulk population seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEvent {
    pub key: ConnectionKey,
    pub strength: f64,
    pub compatibility: f64,
    pub seeded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    #[test]
    fn key_is_order_independent() {
        let ab = ConnectionKey::new(&id("alice"), &id("bob")).unwrap();
        let ba = ConnectionKey::new(&id("bob"), &id("alice")).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.first().as_str(), "alice");
        assert_eq!(ab.second().as_str(), "bob");
    }

    #[test]
    fn key_rejects_self_pairs_and_empty_ids() {
        assert!(matches!(
            ConnectionKey::new(&id("alice"), &id("alice")),
            Err(PlasticityError::InvalidKey(_))
        ));
        assert!(matches!(
            ConnectionKey::new(&id(""), &id("bob")),
            Err(PlasticityError::InvalidKey(_))
        ));
    }

    #[test]
    fn key_serializes_as_its_canonical_text() {
        let key = ConnectionKey::new(&id("bob"), &id("alice")).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"5:alicebob\"");
        assert_eq!(serde_json::from_str::<ConnectionKey>(&json).unwrap(), key);
    }

    #[test]
    fn key_deserialization_rejects_non_canonical_input() {
        for json in [
            r#""1:ba""#,
            r#""1:aa""#,
            r#""9:ab""#,
            r#"{"first":"b","second":"a"}"#,
        ] {
            assert!(serde_json::from_str::<ConnectionKey>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn key_text_form_parses_back() {
        // Ids containing the separator and leading digits must not collide.
        let key = ConnectionKey::new(&id("12:ab"), &id("3:c")).unwrap();
        let text = key.to_string();
        assert_eq!(text, "5:12:ab3:c");
        assert_eq!(ConnectionKey::parse(&text).unwrap(), key);

        let other = ConnectionKey::new(&id("12:ab3"), &id(":c")).unwrap();
        assert_ne!(other.to_string(), text);
    }

    #[test]
    fn key_parse_rejects_garbage() {
        assert!(ConnectionKey::parse("alicebob").is_err());
        assert!(ConnectionKey::parse("x:alicebob").is_err());
        assert!(ConnectionKey::parse("99:alicebob").is_err());
        assert!(ConnectionKey::parse("5:alicealice").is_err());
        // Not canonical: "bob" sorts after "alice".
        assert!(ConnectionKey::parse("3:bobalice").is_err());
    }

    #[test]
    fn peer_lookup() {
        let key = ConnectionKey::new(&id("a"), &id("b")).unwrap();
        assert_eq!(key.peer_of(&id("a")), Some(&id("b")));
        assert_eq!(key.peer_of(&id("b")), Some(&id("a")));
        assert_eq!(key.peer_of(&id("c")), None);
    }

    #[test]
    fn interaction_factors_are_clamped() {
        let r = InteractionResult::success("a", "b")
            .with_factor(1.7)
            .with_gain(f64::NAN);
        assert_eq!(r.factor(), 1.0);
        assert_eq!(r.gain(), 0.0);

        let r = InteractionResult::failure("a", "b").with_factor(-0.3);
        assert_eq!(r.factor(), 0.0);
    }

    #[test]
    fn interaction_key_rejects_self_pair() {
        assert!(InteractionResult::success("a", "a").key().is_err());
    }

    #[test]
    fn success_rate_handles_zero_interactions() {
        let key = ConnectionKey::new(&id("a"), &id("b")).unwrap();
        let mut record = ConnectionRecord::new(key, 0.5, 0.1, 0.01, Utc::now());
        assert_eq!(record.success_rate(), 0.0);
        record.interaction_count = 4;
        record.success_count = 3;
        assert!((record.success_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn row_round_trip_preserves_record() {
        let key = ConnectionKey::new(&id("a"), &id("b")).unwrap();
        let mut record = ConnectionRecord::new(key, 0.42, 0.1, 0.01, Utc::now());
        record.interaction_count = 3;
        record.success_count = 2;
        record.last_interaction_at = Some(Utc::now());

        let back = record.to_row().into_record(&StrengthBounds::default()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn row_validation_catches_bad_rows() {
        let bounds = StrengthBounds::default();
        let key = ConnectionKey::new(&id("a"), &id("b")).unwrap();
        let good = ConnectionRecord::new(key, 0.5, 0.1, 0.01, Utc::now()).to_row();

        let mut row = good.clone();
        row.strength = 1.5;
        assert!(matches!(
            row.into_record(&bounds),
            Err(PlasticityError::MalformedRecord { .. })
        ));

        let mut row = good.clone();
        row.strength = f64::NAN;
        assert!(row.into_record(&bounds).is_err());

        let mut row = good.clone();
        row.success_count = 2;
        assert!(row.into_record(&bounds).is_err());

        let mut row = good.clone();
        row.entity_b = "z".to_string();
        assert!(row.into_record(&bounds).is_err());

        let mut row = good.clone();
        row.decay_rate = 0.0;
        assert!(row.into_record(&bounds).is_err());

        let mut row = good;
        row.canonical_key = "garbage".to_string();
        assert!(matches!(
            row.into_record(&bounds),
            Err(PlasticityError::InvalidKey(_))
        ));
    }
}
