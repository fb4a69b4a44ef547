//! RECOMMEND command - Rank items for one user.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use recomenda_core::{ItemId, UserId};
use recomenda_engine::{Algorithm, Recommendation, RecommendationRequest, RecommendationSource};
use serde::Serialize;
use uuid::Uuid;

use super::{CliError, Context, HumanReadable, output};

/// Arguments for the recommend command.
#[derive(Args)]
pub struct RecommendArgs {
    /// User to recommend for
    pub user_id: String,

    /// Algorithm: content, purchase-history, collaborative or auto
    #[arg(short, long)]
    pub algorithm: Option<Algorithm>,

    /// Number of items to return
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

/// A ranked item with its display label.
#[derive(Debug, Serialize)]
pub struct RankedItem {
    pub rank: usize,
    pub item_id: ItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Response from a recommendation request.
#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub request_id: Uuid,
    pub user_id: UserId,
    pub source: RecommendationSource,
    pub items: Vec<RankedItem>,
    /// Rendered history after recording this recommendation.
    pub history: String,
}

impl RecommendResponse {
    pub fn new(ctx: &Context, recommendation: Recommendation, history: String) -> Self {
        let items = recommendation
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item_id)| RankedItem {
                rank: i + 1,
                name: ctx.snapshot.item(&item_id).map(|item| item.name.clone()),
                item_id,
            })
            .collect();

        Self {
            request_id: recommendation.request_id,
            user_id: recommendation.user_id,
            source: recommendation.source,
            items,
            history,
        }
    }
}

impl HumanReadable for RecommendResponse {
    fn print_human(&self) {
        println!(
            "{} {}",
            "Recommendations for".green().bold(),
            self.user_id.as_str().bold()
        );
        println!("{}", "=".repeat(70));
        println!();

        println!("  {} {}", "Source:".cyan(), self.source);
        println!("  {} {}", "Request:".cyan(), self.request_id.to_string().dimmed());
        println!();

        for item in &self.items {
            match &item.name {
                Some(name) => println!(
                    "  {} {} {}",
                    format!("{:>2}.", item.rank).blue().bold(),
                    name.bold(),
                    format!("[{}]", item.item_id).dimmed()
                ),
                None => println!(
                    "  {} {}",
                    format!("{:>2}.", item.rank).blue().bold(),
                    item.item_id
                ),
            }
        }

        if self.items.is_empty() {
            println!("  {}", "(No recommendations)".dimmed());
        }

        if !self.history.is_empty() {
            println!();
            println!("  {} {}", "History:".yellow(), self.history);
        }
    }
}

/// Execute the recommend command.
pub async fn execute(ctx: &Context, human: bool, args: RecommendArgs) -> Result<()> {
    let user_id = UserId::new(args.user_id);
    if ctx.snapshot.user(&user_id).is_none() {
        return Err(CliError::UnknownUser(user_id.to_string()).into());
    }

    let mut request = RecommendationRequest::new(user_id.as_str());
    request.algorithm = args.algorithm;
    request.top_n = args.count;

    let mut history = ctx.orchestrator.new_history();
    let recommendation = ctx
        .run_blocking(move |orchestrator, snapshot| orchestrator.compute(&request, snapshot))
        .await?;
    history.record(&recommendation);

    let rendered = history.render(&user_id);
    let response = RecommendResponse::new(ctx, recommendation, rendered);
    output(&response, human)
}
