//! Prune weak, stale connections.

use anyhow::Result;
use colored::Colorize;
use std::time::Duration;

use super::Context;

pub async fn run(ctx: &Context, threshold: Option<f64>, window_secs: Option<u64>) -> Result<()> {
    let engine = ctx.engine(None).await?;
    let threshold = threshold.unwrap_or(engine.config().prune_threshold);
    let window = window_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| engine.config().staleness_window());

    let before = engine.matrix().len();
    let pruned = engine.prune_connections(threshold, window).await?;

    println!(
        "{} Pruned {} of {} connection(s) (strength < {}, idle > {}s)",
        "✓".green(),
        pruned.to_string().cyan(),
        before,
        threshold,
        window.as_secs()
    );
    Ok(())
}
