//! CLI command implementations.

pub mod init;
pub mod prune;
pub mod record;
pub mod seed;
pub mod stats;
pub mod strongest;
pub mod suggest;

use anyhow::{Context as _, Result};
use plexus_runtime::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;

/// Resolved configuration shared by every command.
pub struct Context {
    pub config: Config,
    pub db_path: PathBuf,
}

impl Context {
    /// Load plexus.toml and apply the `--db` override.
    pub fn load(db: Option<PathBuf>) -> Result<Self> {
        let config = Config::load()?;
        let db_path = db.unwrap_or_else(|| config.storage.db_path.clone());
        Ok(Self { config, db_path })
    }

    /// Open the database and build an engine over it.
    pub async fn engine(&self, seed: Option<u64>) -> Result<PlasticityEngine> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let store = SqliteConnectionStore::open(&self.db_path)
            .with_context(|| format!("Failed to open {}", self.db_path.display()))?;
        let mut builder =
            PlasticityEngine::builder(Arc::new(store)).with_config(self.config.engine.clone());
        if let Some(seed) = seed {
            builder = builder.with_seed(seed);
        }
        builder.build().await.context("Failed to start engine")
    }
}
