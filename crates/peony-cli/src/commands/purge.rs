use anyhow::{Context, Result};
use clap::Args;
use peony_core::storage::purge_thought;

use super::{load_config, open_store};
use crate::output::format::LIST_OVERVIEW;

#[derive(Args)]
pub struct PurgeArgs {
    /// Thought to delete
    pub id: i64,

    /// Skip the confirmation and delete
    #[arg(long, short)]
    pub yes: bool,
}

pub fn run(args: &PurgeArgs) -> Result<()> {
    let store = open_store(&load_config())?;
    let (thought, events) = store
        .get(args.id)
        .with_context(|| format!("Failed to load thought #{}", args.id))?;

    println!(
        "#{} [{}] {} event(s): {}",
        thought.id,
        thought.current_state,
        events.len(),
        thought.overview(LIST_OVERVIEW)
    );

    if !args.yes {
        eprintln!("\nThis cannot be undone. Use --yes to confirm deletion.");
        return Ok(());
    }

    let removed = purge_thought(&store, args.id)?;
    println!("Purged #{} and {removed} event(s).", args.id);
    Ok(())
}
