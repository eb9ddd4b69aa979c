//! Seed connections across a population.

use anyhow::Result;
use colored::Colorize;
use plexus_core::types::EntityId;

use super::Context;

pub async fn run(
    ctx: &Context,
    entities: &[String],
    compatibility: f64,
    seed: Option<u64>,
) -> Result<()> {
    let engine = ctx.engine(seed).await?;
    let population: Vec<EntityId> = entities.iter().map(|e| EntityId::from(e.as_str())).collect();

    let created = engine
        .initialize_connections(&population, |_, _| compatibility)
        .await?;

    println!(
        "{} Seeded {} new connection(s) across {} entities",
        "✓".green(),
        created.to_string().cyan(),
        engine.matrix().entity_count()
    );
    Ok(())
}
