//! Plexus Core Prelude: convenient imports for common usage.
//!
//! ```rust
//! use plexus_core::prelude::*;
//! ```

// Re-export commonly used types
pub use crate::types::{
    EntityId, ConnectionKey,
    ConnectionRecord, ConnectionRow,
    InteractionResult, InteractionKind,
    LearningEvent, PruneEvent, SeedEvent,
};

// Re-export configuration
pub use crate::config::{PlasticityConfig, StrengthBounds};

// Re-export the ConnectionStore trait
pub use crate::store::ConnectionStore;

// Re-export error types
pub use crate::error::{
    ConfigError, PlasticityError, PlasticityResult, StorageError, StorageResult,
};
