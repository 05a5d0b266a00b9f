use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;

use super::{load_config, open_store};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct AddArgs {
    /// Thought text (asked for on stdin when omitted)
    pub content: Vec<String>,
}

pub fn run(args: &AddArgs, format: OutputFormat) -> Result<()> {
    let mut content = args.content.join(" ").trim().to_string();
    if content.is_empty() {
        eprint!("What would you like to hold? ");
        io::stderr().flush()?;
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read thought from stdin")?;
        content = line.trim().to_string();
    }

    let store = open_store(&load_config())?;
    let id = store.capture(&content).context("Failed to save thought")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "id": id })),
        OutputFormat::Text => println!("Saved as #{id}"),
    }
    Ok(())
}
