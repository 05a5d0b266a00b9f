use anyhow::{Context, Result};

use super::{load_config, open_store};
use crate::output::format::format_state_counts;
use crate::output::OutputFormat;

pub fn run(format: OutputFormat) -> Result<()> {
    let store = open_store(&load_config())?;
    let counts = store.state_counts().context("Failed to count thoughts")?;
    let version = store.schema_version()?;
    println!("{}", format_state_counts(&counts, version, format).trim_end());
    Ok(())
}
