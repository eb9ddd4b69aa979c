//! # Plexus Runtime
//!
//! The adaptive connection engine: a write-through connection matrix, the
//! plasticity engine that reinforces, decays and prunes it, network
//! statistics, and store adapters.
//!
//! Entities that work well together grow stronger connections; pairs that
//! fail or fall silent weaken and are eventually pruned. The engine can then
//! suggest who each entity should interact with next.
//!
//! ```rust
//! use std::sync::Arc;
//! use plexus_core::prelude::*;
//! use plexus_runtime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PlasticityError> {
//!     let engine = PlasticityEngine::builder(Arc::new(InMemoryConnectionStore::new()))
//!         .with_seed(1)
//!         .build()
//!         .await?;
//!
//!     let team: Vec<EntityId> =
//!         ["ada", "grace", "linus"].into_iter().map(EntityId::from).collect();
//!     engine
//!         .initialize_connections(&team, |a, b| {
//!             if a.as_str() == "ada" && b.as_str() == "grace" { 1.0 } else { 0.0 }
//!         })
//!         .await?;
//!
//!     engine
//!         .update_connection_strength(&InteractionResult::success("ada", "grace"))
//!         .await?;
//!
//!     let best = engine.strongest_connections(&EntityId::from("ada"), 1);
//!     assert_eq!(best[0].0.as_str(), "grace");
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod events;
pub mod matrix;
pub mod memory_store;
pub mod prelude;
pub mod sqlite_store;
pub mod stats;
