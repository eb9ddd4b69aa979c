//! Record one interaction outcome.

use anyhow::Result;
use colored::Colorize;
use plexus_core::types::{EntityId, InteractionKind, InteractionResult};

use super::Context;

/// What happened in the interaction, as given on the command line.
pub struct Outcome {
    pub success: bool,
    pub factor: Option<f64>,
    pub gain: Option<f64>,
    pub kind: String,
}

impl Outcome {
    fn into_result(self, a: &str, b: &str) -> InteractionResult {
        let mut result =
            InteractionResult::new(a, b, self.success).with_kind(parse_kind(&self.kind));
        if let Some(factor) = self.factor {
            result = result.with_factor(factor);
        }
        if let Some(gain) = self.gain {
            result = result.with_gain(gain);
        }
        result
    }
}

fn parse_kind(kind: &str) -> InteractionKind {
    match kind.to_ascii_lowercase().as_str() {
        "dialogue" => InteractionKind::Dialogue,
        "collaboration" => InteractionKind::Collaboration,
        "exchange" => InteractionKind::Exchange,
        _ => InteractionKind::Custom(kind.to_string()),
    }
}

pub async fn run(ctx: &Context, a: &str, b: &str, outcome: Outcome) -> Result<()> {
    let engine = ctx.engine(None).await?;
    let before = engine.strength(&EntityId::from(a), &EntityId::from(b));

    let result = outcome.into_result(a, b);
    let after = engine.update_connection_strength(&result).await?;

    let arrow = if after >= before { "↑".green() } else { "↓".red() };
    println!(
        "{} {} ↔ {}: {:.4} → {}",
        arrow,
        a.cyan(),
        b.cyan(),
        before,
        format!("{:.4}", after).bold()
    );
    Ok(())
}
