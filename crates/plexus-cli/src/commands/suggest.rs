//! Suggest interaction partners.

use anyhow::{bail, Result};
use colored::Colorize;
use plexus_core::types::EntityId;

use super::Context;

pub async fn run(ctx: &Context, entity: &str, k: usize) -> Result<()> {
    let engine = ctx.engine(None).await?;
    let id = EntityId::from(entity);
    if !engine.matrix().entities().contains(&id) {
        bail!("Unknown entity '{}'. Run {} first.", entity, "plexus seed".cyan());
    }

    let suggestions = engine.suggest_interactions(&id, k);
    if suggestions.is_empty() {
        println!("{} No partners known for {}", "•".yellow(), entity.cyan());
        return Ok(());
    }

    println!("{} {}", "Suggested partners for".white().bold(), entity.cyan().bold());
    for (rank, (peer, score)) in suggestions.iter().enumerate() {
        let strength = engine.strength(&id, peer);
        println!(
            "  {:>2}. {:<24} score {:.4}  strength {:.4}",
            rank + 1,
            peer.as_str(),
            score,
            strength
        );
    }
    Ok(())
}
