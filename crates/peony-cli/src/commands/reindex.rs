use anyhow::Result;
use clap::Args;
use peony_core::storage::reindex_thought_ids;

use super::{load_config, open_store};

#[derive(Args)]
pub struct ReindexArgs {
    /// Skip the confirmation and renumber
    #[arg(long, short)]
    pub yes: bool,
}

pub fn run(args: &ReindexArgs) -> Result<()> {
    let store = open_store(&load_config())?;
    let total: u64 = store.state_counts()?.values().sum();

    if !args.yes {
        println!("Reindexing renumbers {total} thought(s) to #1..#{total}, keeping their order.");
        eprintln!("Ids you may have noted down will change. Use --yes to confirm.");
        return Ok(());
    }

    eprintln!("Renumbering thoughts...");
    let moved = reindex_thought_ids(&store)?;
    eprintln!("Renumbered {moved} of {total} thought(s).");
    Ok(())
}
