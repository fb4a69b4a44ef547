//! SIMILAR command - Items whose content resembles given items.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use recomenda_core::ItemId;
use recomenda_engine::{ContentIndex, ContentSimilarityEngine, FeatureVectorizer, cosine};
use serde::Serialize;
use std::collections::HashSet;

use super::{CliError, Context, HumanReadable, output};

/// Arguments for the similar command.
#[derive(Args)]
pub struct SimilarArgs {
    /// Item IDs to find neighbours for (treated like a purchase history)
    #[arg(required = true)]
    pub item_ids: Vec<String>,

    /// Number of items to return
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SimilarItem {
    pub item_id: ItemId,
    pub label: String,
    pub similarity: f64,
}

/// Response from a similarity query.
#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub query: Vec<ItemId>,
    pub items: Vec<SimilarItem>,
}

impl HumanReadable for SimilarResponse {
    fn print_human(&self) {
        let query: Vec<&str> = self.query.iter().map(ItemId::as_str).collect();
        println!("{} {}", "Similar to".green().bold(), query.join(", ").bold());
        println!("{}", "=".repeat(70));
        println!();

        for item in &self.items {
            println!(
                "  {} {}",
                format!("{:.3}", item.similarity).cyan(),
                item.label
            );
        }

        if self.items.is_empty() {
            println!("  {}", "(No similar items)".dimmed());
        }
    }
}

/// Execute the similar command.
pub async fn execute(ctx: &Context, human: bool, args: SimilarArgs) -> Result<()> {
    let query: Vec<ItemId> = args.item_ids.into_iter().map(ItemId::new).collect();
    if let Some(missing) = query.iter().find(|id| ctx.snapshot.item(id).is_none()) {
        return Err(CliError::UnknownItem(missing.to_string()).into());
    }

    let top_n = args.count.unwrap_or(ctx.orchestrator.config().top_n);
    let stopwords = ctx.orchestrator.config().stopwords;
    let purchased = query.clone();

    let scored = ctx
        .run_blocking(move |_, snapshot| {
            let index = ContentIndex::build(&snapshot.items, FeatureVectorizer::with_locale(stopwords));
            let ranked = ContentSimilarityEngine::default().rank_similar_to(
                &index,
                &purchased,
                &HashSet::new(),
                top_n,
            );
            let profile = index.history_vector(&purchased);
            ranked
                .into_iter()
                .map(|id| {
                    let similarity = index.vector(&id).map_or(0.0, |v| cosine(&profile, v));
                    (id, similarity)
                })
                .collect::<Vec<_>>()
        })
        .await?;

    let items = scored
        .into_iter()
        .map(|(item_id, similarity)| SimilarItem {
            label: ctx.item_label(&item_id),
            item_id,
            similarity,
        })
        .collect();

    output(&SimilarResponse { query, items }, human)
}
