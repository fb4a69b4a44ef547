//! Command implementations for the recomenda CLI.
//!
//! Each command module provides:
//! - Args struct for clap argument parsing
//! - execute() function that performs the command
//! - Human-readable and JSON output formatting

pub mod metrics;
pub mod popular;
pub mod recommend;
pub mod session;
pub mod similar;

use anyhow::Result;
use recomenda_core::{CatalogSnapshot, ItemId};
use recomenda_engine::{InterestTable, RecommendationOrchestrator};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors loading the collaborator data the engine runs on.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Everything a command needs: the loaded snapshot and a configured engine.
#[derive(Clone)]
pub struct Context {
    pub snapshot: Arc<CatalogSnapshot>,
    pub orchestrator: Arc<RecommendationOrchestrator>,
}

impl Context {
    /// Display label for an item: `id (name)` when the name is known.
    pub fn item_label(&self, id: &ItemId) -> String {
        match self.snapshot.item(id) {
            Some(item) if !item.name.is_empty() => format!("{} ({})", id, item.name),
            _ => id.to_string(),
        }
    }

    /// Runs CPU-bound engine work off the async runtime.
    pub async fn run_blocking<T, F>(&self, work: F) -> Result<T, CliError>
    where
        T: Send + 'static,
        F: FnOnce(&RecommendationOrchestrator, &CatalogSnapshot) -> T + Send + 'static,
    {
        let orchestrator = Arc::clone(&self.orchestrator);
        let snapshot = Arc::clone(&self.snapshot);
        let value =
            tokio::task::spawn_blocking(move || work(&orchestrator, &snapshot)).await?;
        Ok(value)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a catalog snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<CatalogSnapshot, CliError> {
    let snapshot: CatalogSnapshot = read_json(path)?;
    tracing::debug!(
        path = %path.display(),
        items = snapshot.items.len(),
        users = snapshot.users.len(),
        ratings = snapshot.ratings.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

/// Load interest rules from a JSON list, or the built-in table.
pub fn load_interest_rules(path: Option<&Path>) -> Result<InterestTable, CliError> {
    match path {
        Some(path) => read_json(path),
        None => Ok(InterestTable::default()),
    }
}

/// Print output in JSON or human-readable format.
pub fn output<T: Serialize + HumanReadable>(value: &T, human: bool) -> Result<()> {
    if human {
        value.print_human();
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Trait for types that can be printed in human-readable format.
pub trait HumanReadable {
    fn print_human(&self);
}
