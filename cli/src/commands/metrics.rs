//! METRICS command - Interaction and rating summaries.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use recomenda_core::UserId;
use recomenda_engine::MetricsSummary;

use super::{Context, HumanReadable, output};

/// Arguments for the metrics command.
#[derive(Args)]
pub struct MetricsArgs {
    /// Restrict metrics to one user
    #[arg(short, long)]
    pub user: Option<String>,
}

impl HumanReadable for MetricsSummary {
    fn print_human(&self) {
        let scope = self
            .user_id
            .as_ref()
            .map_or_else(|| "all users".to_string(), |u| u.to_string());
        println!("{} {}", "Metrics for".green().bold(), scope.bold());
        println!("{}", "=".repeat(70));
        println!();

        println!("  {} {}", "Clicks:".cyan(), self.clicks);
        println!("  {} {}", "Interactions:".cyan(), self.interactions);
        println!("  {} {:.2}%", "Acceptance rate:".cyan(), self.acceptance_rate);
        match self.mean_rating {
            Some(mean) => println!(
                "  {} {:.2} {}",
                "Mean rating:".cyan(),
                mean,
                format!("({} ratings)", self.ratings).dimmed()
            ),
            None => println!("  {} {}", "Mean rating:".cyan(), "n/a".dimmed()),
        }
    }
}

/// Execute the metrics command.
pub async fn execute(ctx: &Context, human: bool, args: MetricsArgs) -> Result<()> {
    let user = args.user.map(UserId::new);
    let summary = MetricsSummary::summarize(&ctx.snapshot, user.as_ref());
    output(&summary, human)
}
