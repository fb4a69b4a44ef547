//! Command-line interface for the Recomenda catalog recommender.
//!
//! This CLI tool loads a catalog snapshot (items, users, ratings,
//! interactions) from JSON and runs the recommendation engine over it:
//! - recommend: Rank items for one user
//! - similar: Items whose content resembles given items
//! - popular: Highest-rated items
//! - metrics: Click, acceptance and rating summaries
//! - session: Interactive loop with a shared recommendation history
//!
//! Configuration via environment:
//! - RECOMENDA_SNAPSHOT: Path to the snapshot JSON file
//! - RECOMENDA_TOP_N, RECOMENDA_HISTORY_CAPACITY, RECOMENDA_MIN_RATINGS,
//!   RECOMENDA_STOPWORDS, RECOMENDA_ALGORITHM: Engine defaults
//! - RECOMENDA_LOG / RUST_LOG: Log filter (logs go to stderr)

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use recomenda_engine::{RecommendationOrchestrator, RecommenderConfig, StopWordLocale};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commands::{
    Context, metrics::MetricsArgs, popular::PopularArgs, recommend::RecommendArgs,
    session::SessionArgs, similar::SimilarArgs,
};

/// Recomenda catalog recommender CLI
///
/// Recommend catalog items from a JSON snapshot. Designed for both
/// scripts (JSON output) and humans (--human flag for formatted output).
#[derive(Parser)]
#[command(name = "recomenda")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output human-readable formatted text instead of JSON
    #[arg(long, global = true)]
    human: bool,

    /// Catalog snapshot JSON file
    #[arg(long, env = "RECOMENDA_SNAPSHOT", global = true)]
    snapshot: PathBuf,

    /// Interest rule table JSON file (defaults to the built-in table)
    #[arg(long, global = true)]
    interest_rules: Option<PathBuf>,

    /// Default number of recommendations
    #[arg(long, global = true)]
    top_n: Option<usize>,

    /// Entries kept per user in the recommendation history
    #[arg(long, global = true)]
    history_capacity: Option<usize>,

    /// Ratings an item needs before popularity ranks it
    #[arg(long, global = true)]
    min_ratings: Option<usize>,

    /// Stop word list: pt, en or none
    #[arg(long, global = true)]
    stopwords: Option<StopWordLocale>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RECOMENDA_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    fn config(&self) -> Result<RecommenderConfig> {
        let config = RecommenderConfig::from_env_with(|config| {
            if let Some(top_n) = self.top_n {
                config.top_n = top_n;
            }
            if let Some(capacity) = self.history_capacity {
                config.history_capacity = capacity;
            }
            if let Some(min) = self.min_ratings {
                config.min_rating_count = min;
            }
            if let Some(stopwords) = self.stopwords {
                config.stopwords = stopwords;
            }
        })?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend items for a user
    Recommend(RecommendArgs),

    /// Find items similar to the given items
    Similar(SimilarArgs),

    /// List the most popular items
    Popular(PopularArgs),

    /// Show interaction metrics
    Metrics(MetricsArgs),

    /// Run an interactive session reading commands from stdin
    Session(SessionArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let ctx = match build_context(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Recommend(args) => commands::recommend::execute(&ctx, cli.human, args).await,
        Commands::Similar(args) => commands::similar::execute(&ctx, cli.human, args).await,
        Commands::Popular(args) => commands::popular::execute(&ctx, cli.human, args).await,
        Commands::Metrics(args) => commands::metrics::execute(&ctx, cli.human, args).await,
        Commands::Session(args) => commands::session::execute(&ctx, cli.human, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build_context(cli: &Cli) -> Result<Context> {
    let config = cli.config()?;
    tracing::debug!(?config, "resolved configuration");

    let rules = commands::load_interest_rules(cli.interest_rules.as_deref())?;
    let snapshot = commands::load_snapshot(&cli.snapshot)?;
    let orchestrator = RecommendationOrchestrator::new(config, rules)?;

    Ok(Context {
        snapshot: Arc::new(snapshot),
        orchestrator: Arc::new(orchestrator),
    })
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
