//! Convenient re-exports for users of the runtime.

pub use crate::engine::{EngineBuilder, PlasticityEngine};
pub use crate::events::{EventLog, PlasticityEvent};
pub use crate::matrix::ConnectionMatrix;
pub use crate::memory_store::InMemoryConnectionStore;
pub use crate::stats::{NetworkStatistics, StatisticsReporter};

#[cfg(feature = "sqlite")]
pub use crate::sqlite_store::SqliteConnectionStore;
