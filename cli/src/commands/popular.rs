//! POPULAR command - Highest-rated items across all users.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use recomenda_core::ItemId;
use recomenda_engine::popularity::item_stats;
use recomenda_engine::{PopularityBasis, PopularityRanker};
use serde::Serialize;
use std::collections::HashSet;

use super::{Context, HumanReadable, output};

/// Arguments for the popular command.
#[derive(Args)]
pub struct PopularArgs {
    /// Number of items to return
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Minimum ratings an item needs (overrides --min-ratings)
    #[arg(long)]
    pub min_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PopularItem {
    pub item_id: ItemId,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    pub count: usize,
}

/// Response from the popularity ranking.
#[derive(Debug, Serialize)]
pub struct PopularResponse {
    /// "ratings" or "recency".
    pub basis: &'static str,
    pub items: Vec<PopularItem>,
}

impl HumanReadable for PopularResponse {
    fn print_human(&self) {
        println!("{}", "Popular Items".green().bold());
        println!("{}", "=".repeat(70));
        println!();
        println!("  {} {}", "Ranked by:".cyan(), self.basis);
        println!();

        for (i, item) in self.items.iter().enumerate() {
            let stats = match item.mean {
                Some(mean) => format!("{:.2} avg, {} ratings", mean, item.count),
                None => "new".to_string(),
            };
            println!(
                "  {} {} {}",
                format!("{:>2}.", i + 1).blue().bold(),
                item.label,
                format!("({stats})").dimmed()
            );
        }

        if self.items.is_empty() {
            println!("  {}", "(No items qualify)".dimmed());
        }
    }
}

/// Execute the popular command.
pub async fn execute(ctx: &Context, human: bool, args: PopularArgs) -> Result<()> {
    let config = ctx.orchestrator.config();
    let top_n = args.count.unwrap_or(config.top_n);
    let ranker = PopularityRanker::new(args.min_count.unwrap_or(config.min_rating_count));

    let snapshot = &ctx.snapshot;
    let recent = snapshot.recent_items();
    let (ranked, basis) = ranker.rank(&snapshot.ratings, &recent, &HashSet::new(), top_n);
    let stats = item_stats(&snapshot.ratings);

    let items = ranked
        .into_iter()
        .map(|item_id| {
            let stat = stats.iter().find(|s| s.item_id == item_id);
            PopularItem {
                label: ctx.item_label(&item_id),
                mean: stat.map(|s| s.mean),
                count: stat.map_or(0, |s| s.count),
                item_id,
            }
        })
        .collect();

    let basis = match basis {
        PopularityBasis::Ratings => "ratings",
        PopularityBasis::Recency => "recency",
    };
    output(&PopularResponse { basis, items }, human)
}
