//! Show an entity's strongest connections.

use anyhow::Result;
use colored::Colorize;
use plexus_core::types::EntityId;

use super::Context;

pub async fn run(ctx: &Context, entity: &str, limit: usize) -> Result<()> {
    let engine = ctx.engine(None).await?;
    let id = EntityId::from(entity);
    let peers = engine.strongest_connections(&id, limit);

    if peers.is_empty() {
        println!("{} {} has no connections", "•".yellow(), entity.cyan());
        return Ok(());
    }

    println!("{} {}", "Strongest connections of".white().bold(), entity.cyan().bold());
    for (peer, strength) in peers {
        let interactions = engine
            .connection(&id, &peer)
            .map_or(0, |record| record.interaction_count);
        println!(
            "  {:<24} {:.4}  ({} interaction(s))",
            peer.as_str(),
            strength,
            interactions
        );
    }
    Ok(())
}
