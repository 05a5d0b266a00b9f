pub mod add;
pub mod config;
pub mod purge;
pub mod reindex;
pub mod stats;
pub mod tend;
pub mod version;
pub mod view;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use peony_core::storage::resolve_db_path;
use peony_core::{PeonyConfig, Store, StoreOptions};
use tracing::warn;

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a thought
    #[command(visible_alias = "a")]
    Add(add::AddArgs),
    /// List thoughts, or show one thought with its history
    #[command(visible_alias = "v")]
    View(view::ViewArgs),
    /// List thoughts ready to be tended, or tend one
    #[command(visible_alias = "t")]
    Tend(tend::TendArgs),
    /// Show how many thoughts sit in each state
    Stats,
    /// Show or change settings
    Config(config::ConfigArgs),
    /// Permanently delete a thought and its history
    Purge(purge::PurgeArgs),
    /// Renumber thought ids to close gaps
    Reindex(reindex::ReindexArgs),
    /// Print version information
    Version,
}

/// Shared `--page` / `--limit` flags.
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
    pub page: i64,

    /// Thoughts per page
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..=500))]
    pub limit: i64,
}

impl PageArgs {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Settings from disk, or defaults when the file is unreadable.
pub(crate) fn load_config() -> PeonyConfig {
    match PeonyConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("{e}; using default settings");
            PeonyConfig::default()
        }
    }
}

pub(crate) fn open_store(config: &PeonyConfig) -> Result<Store> {
    let path = resolve_db_path().context("Failed to locate the database")?;
    let options = StoreOptions::default().with_settle_duration(config.settle_duration());
    Store::open(&path, options)
        .with_context(|| format!("Failed to open database at {}", path.display()))
}
