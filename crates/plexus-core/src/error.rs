//! Error types for Plexus operations.
//!
//! Invalid input pairs are rejected before they reach the connection matrix.
//! Storage failures are surfaced to callers with a retry hint; the engine
//! never retries on its own. Out-of-range strengths and factors are clamped,
//! never reported as errors.

use std::time::Duration;
use thiserror::Error;

/// Result type for engine operations.
pub type PlasticityResult<T> = std::result::Result<T, PlasticityError>;

/// Result type for store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during plasticity operations.
#[derive(Error, Debug, Clone)]
pub enum PlasticityError {
    /// Malformed or self-referential entity pair.
    #[error("Invalid connection key: {0}")]
    InvalidKey(String),

    /// A persisted row that fails validation.
    #[error("Malformed connection record {key}: {reason}")]
    MalformedRecord { key: String, reason: String },

    /// Persistence read/write failure or timeout.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Pruning hit a storage failure after removing `pruned` connections.
    #[error("Pruning stopped after removing {pruned} connection(s): {source}")]
    PartialPrune {
        pruned: usize,
        #[source]
        source: StorageError,
    },

    /// Invalid engine configuration.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl PlasticityError {
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        PlasticityError::InvalidKey(reason.into())
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlasticityError::Storage(e) | PlasticityError::PartialPrune { source: e, .. } => {
                e.is_retryable()
            }
            _ => false,
        }
    }

    /// Connections removed before a pruning pass failed.
    pub fn pruned_count(&self) -> Option<usize> {
        match self {
            PlasticityError::PartialPrune { pruned, .. } => Some(*pruned),
            _ => None,
        }
    }
}

/// Errors reported by a [`crate::store::ConnectionStore`].
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// The operation did not finish within the caller's timeout.
    #[error("Store operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// Failure that may clear up on retry (busy database, lost connection).
    #[error("Transient store failure: {0}")]
    Transient(String),

    /// Failure that will not clear up on retry (schema violation, corrupt file).
    #[error("Permanent store failure: {0}")]
    Permanent(String),
}

impl StorageError {
    pub fn transient(msg: impl Into<String>) -> Self {
        StorageError::Transient(msg.into())
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        StorageError::Permanent(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Timeout { .. } | StorageError::Transient(_))
    }
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{field} out of range: {value} (must be {min}-{max})")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}
