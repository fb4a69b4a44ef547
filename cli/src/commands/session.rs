//! SESSION command - Interactive loop sharing one recommendation history.
//!
//! Reads one command per line from stdin:
//!
//! ```text
//! recommend <user> [algorithm] [count]
//! history <user>
//! forget <user> <item>
//! clear <user>
//! quit
//! ```
//!
//! Each `recommend` result is recorded before the next line is read, so
//! history mutations for a user never overlap.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use recomenda_core::{ItemId, UserId};
use recomenda_engine::{
    Algorithm, ConfigError, RecommendationHistory, RecommendationRequest, RecommenderConfig,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::recommend::RecommendResponse;
use super::{Context, HumanReadable, output};

/// Arguments for the session command.
#[derive(Args)]
pub struct SessionArgs {
    /// History entries kept per user (overrides --history-capacity)
    #[arg(long)]
    pub capacity: Option<usize>,
}

/// One parsed session line.
#[derive(Debug, PartialEq)]
enum SessionCommand {
    Recommend {
        user: UserId,
        algorithm: Option<Algorithm>,
        count: Option<usize>,
    },
    History(UserId),
    Forget(UserId, ItemId),
    Clear(UserId),
    Quit,
}

fn parse_line(line: &str) -> Result<Option<SessionCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return Ok(None),
        ["quit"] | ["exit"] => SessionCommand::Quit,
        ["recommend", user, rest @ ..] if rest.len() <= 2 => {
            let algorithm = rest.first().map(|a| a.parse::<Algorithm>()).transpose()?;
            let count = rest
                .get(1)
                .map(|n| n.parse::<usize>().map_err(|e| format!("invalid count '{n}': {e}")))
                .transpose()?;
            SessionCommand::Recommend {
                user: UserId::new(*user),
                algorithm,
                count,
            }
        }
        ["history", user] => SessionCommand::History(UserId::new(*user)),
        ["forget", user, item] => SessionCommand::Forget(UserId::new(*user), ItemId::new(*item)),
        ["clear", user] => SessionCommand::Clear(UserId::new(*user)),
        _ => return Err(format!("unrecognised command: {line}")),
    };
    Ok(Some(command))
}

/// History view for one user.
#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub user_id: UserId,
    pub items: Vec<ItemId>,
    pub rendered: String,
}

impl HistoryView {
    fn new(history: &RecommendationHistory, user: UserId) -> Self {
        Self {
            items: history.get_history(&user),
            rendered: history.render(&user),
            user_id: user,
        }
    }
}

impl HumanReadable for HistoryView {
    fn print_human(&self) {
        if self.items.is_empty() {
            println!("{} {}", self.user_id.as_str().bold(), "(empty)".dimmed());
        } else {
            println!("{} {}", self.user_id.as_str().bold(), self.rendered);
        }
    }
}

/// History capacity for the session, checked like any configured value.
fn history_capacity(
    config: &RecommenderConfig,
    capacity: Option<usize>,
) -> Result<usize, ConfigError> {
    let config = RecommenderConfig {
        history_capacity: capacity.unwrap_or(config.history_capacity),
        ..config.clone()
    };
    config.validate()?;
    Ok(config.history_capacity)
}

/// Execute the session command.
pub async fn execute(ctx: &Context, human: bool, args: SessionArgs) -> Result<()> {
    let capacity = history_capacity(ctx.orchestrator.config(), args.capacity)?;
    let mut history = RecommendationHistory::new(capacity);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if human {
        eprintln!(
            "{}",
            "recomenda session: recommend <user> [algorithm] [count] | history <user> | forget <user> <item> | clear <user> | quit"
                .dimmed()
        );
    }

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("Error: {}", e);
                continue;
            }
        };

        match command {
            SessionCommand::Quit => break,
            SessionCommand::Recommend {
                user,
                algorithm,
                count,
            } => {
                let mut request = RecommendationRequest::new(user.as_str());
                request.algorithm = algorithm;
                request.top_n = count;

                let recommendation = ctx
                    .run_blocking(move |orchestrator, snapshot| {
                        orchestrator.compute(&request, snapshot)
                    })
                    .await?;
                history.record(&recommendation);

                let rendered = history.render(&user);
                output(&RecommendResponse::new(ctx, recommendation, rendered), human)?;
            }
            SessionCommand::History(user) => output(&HistoryView::new(&history, user), human)?,
            SessionCommand::Forget(user, item) => {
                if !history.remove(&user, &item) {
                    eprintln!("Error: {} not in history of {}", item, user);
                }
                output(&HistoryView::new(&history, user), human)?;
            }
            SessionCommand::Clear(user) => {
                history.clear(&user);
                output(&HistoryView::new(&history, user), human)?;
            }
        }
    }

    Ok(())
}
