use anyhow::{Context, Result};
use clap::Args;
use peony_core::State;

use super::{load_config, open_store, PageArgs};
use crate::output::format::{format_thought_full, format_thought_list, LIST_OVERVIEW};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ViewArgs {
    /// Show this thought in full
    pub id: Option<i64>,

    /// Only list thoughts in this state (captured, resting, tended, evolved, released, archived)
    #[arg(long, conflicts_with = "id")]
    pub state: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

pub fn run(args: &ViewArgs, format: OutputFormat) -> Result<()> {
    // reject a bad filter before touching the database
    let filter: Option<State> = args.state.as_deref().map(str::parse::<State>).transpose()?;
    let store = open_store(&load_config())?;

    if let Some(id) = args.id {
        let (thought, events) = store
            .get(id)
            .with_context(|| format!("Failed to load thought #{id}"))?;
        println!("{}", format_thought_full(&thought, &events, store.now(), format));
        return Ok(());
    }

    let (limit, offset) = (args.page.limit, args.page.offset());
    let thoughts = match filter {
        Some(state) => store.list_by_state(limit, offset, state),
        None => store.list(limit, offset),
    }
    .context("Failed to list thoughts")?;

    let empty = if args.page.page > 1 {
        "No thoughts on this page."
    } else {
        "No thoughts yet."
    };
    println!(
        "{}",
        format_thought_list(&thoughts, args.page.page, LIST_OVERVIEW, empty, format)
    );
    Ok(())
}
