//! # Plexus Core
//!
//! Core types and contracts for adaptive connection strengths.
//!
//! Plexus tracks how strongly each pair of entities (agents) is connected and
//! adapts that strength from the outcomes of their interactions:
//!
//! - **REINFORCE**: successful interactions strengthen a connection, with
//!   diminishing returns as it nears its ceiling (Hebbian saturation)
//! - **DECAY**: failed interactions weaken a connection in proportion to
//!   its current strength
//! - **PRUNE**: connections that are both weak and stale are removed
//!
//! This crate holds the shared vocabulary: identifiers and canonical pair
//! keys, connection records and their persisted row shape, interaction
//! results, the error taxonomy, engine configuration, and the async
//! [`store::ConnectionStore`] contract that persistence backends implement.
//!
//! ## Quick Start
//!
//! ```rust
//! use plexus_core::prelude::*;
//!
//! let key = ConnectionKey::new(&EntityId::from("bob"), &EntityId::from("alice")).unwrap();
//! assert_eq!(key.first().as_str(), "alice");
//! assert_eq!(key.to_string(), "5:alicebob");
//! ```

pub mod config;
pub mod error;
pub mod prelude;
pub mod store;
pub mod types;
