//! Show network statistics.

use anyhow::{Context as _, Result};
use colored::Colorize;

use super::Context;

pub async fn run(ctx: &Context, json: bool) -> Result<()> {
    let engine = ctx.engine(None).await?;
    let stats = engine.network_statistics();

    if json {
        let text = serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?;
        println!("{}", text);
        return Ok(());
    }

    println!("{}", "Plexus Network Statistics".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();

    println!("{}", "Structure".blue().bold());
    println!("  Entities:          {}", stats.entity_count.to_string().cyan());
    println!("  Connections:       {}", stats.connection_count.to_string().cyan());
    println!("  Components:        {}", stats.components.to_string().cyan());
    println!("  Density:           {:.6}", stats.density);
    println!();

    println!("{}", "Strength".blue().bold());
    println!("  Mean:              {:.4}", stats.mean_strength);
    println!("  Std dev:           {:.4}", stats.strength_std_dev);
    println!("  Min / max:         {:.4} / {:.4}", stats.min_strength, stats.max_strength);
    println!("  Mean success rate: {:.1}%", stats.mean_success_rate * 100.0);
    println!();

    println!("{}", "═".repeat(40).dimmed());

    Ok(())
}
