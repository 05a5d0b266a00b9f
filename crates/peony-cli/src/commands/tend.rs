use std::io;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use peony_core::{State, Store};

use super::{load_config, open_store, PageArgs};
use crate::editor::{self, Edited};
use crate::output::format::{format_thought_list, TEND_OVERVIEW};
use crate::output::OutputFormat;
use crate::prompt::Prompter;

const RESOLUTIONS: [&str; 4] = ["rest", "evolve", "release", "archive"];

#[derive(Args)]
pub struct TendArgs {
    /// Thought to tend; lists the ones ready for tending when omitted
    pub id: Option<i64>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Note to record with the tend
    #[arg(long, requires = "id")]
    pub note: Option<String>,

    /// Resolve the thought without asking
    #[arg(long, value_enum, requires = "id")]
    pub resolve: Option<Resolution>,

    /// Keep the content as it is instead of opening an editor
    #[arg(long, requires = "id")]
    pub no_edit: bool,

    /// Answer yes to the confirmation prompts
    #[arg(long, short, requires = "id")]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resolution {
    Rest,
    Evolve,
    Release,
    Archive,
}

impl Resolution {
    pub fn state(self) -> State {
        match self {
            Resolution::Rest => State::Resting,
            Resolution::Evolve => State::Evolved,
            Resolution::Release => State::Released,
            Resolution::Archive => State::Archived,
        }
    }

    fn from_choice(choice: &str) -> Option<Self> {
        Resolution::from_str(choice, true).ok()
    }
}

pub fn run(args: &TendArgs, format: OutputFormat) -> Result<()> {
    let config = load_config();
    let store = open_store(&config)?;

    match args.id {
        Some(id) => tend_one(&store, id, args, config.editor.as_deref(), format),
        None => list_ready(&store, &args.page, format),
    }
}

fn list_ready(store: &Store, page: &PageArgs, format: OutputFormat) -> Result<()> {
    let thoughts = store
        .list_eligible(page.limit, page.offset(), store.now())
        .context("Failed to list thoughts ready for tending")?;
    println!(
        "{}",
        format_thought_list(
            &thoughts,
            page.page,
            TEND_OVERVIEW,
            "Nothing is ready to tend.",
            format
        )
    );
    Ok(())
}

fn tend_one(
    store: &Store,
    id: i64,
    args: &TendArgs,
    editor_cmd: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let (thought, _) = store
        .get_eligible(id)
        .with_context(|| format!("Thought #{id} is not ready to tend"))?;

    let edited = if args.no_edit {
        Edited {
            content: thought.content.clone(),
            note: args.note.clone(),
        }
    } else {
        editor::edit(
            editor_cmd,
            &thought.content,
            args.note.as_deref().unwrap_or_default(),
        )?
    };

    let stdin = io::stdin();
    let mut prompt = Prompter::new(stdin.lock(), io::stderr());

    if !args.yes && !prompt.yes_no("Are you satisfied with the changes?")? {
        eprintln!("Nothing saved.");
        return Ok(());
    }
    let mark = args.yes
        || prompt.yes_no(
            "Mark this thought as tended? (the note is saved only if you say yes)",
        )?;

    if edited.content != thought.content {
        store
            .update_content(id, &edited.content)
            .context("Failed to save content")?;
    }
    if !mark {
        eprintln!("Saved #{id} without tending it.");
        return Ok(());
    }

    store
        .mark_tended(id, edited.note.as_deref())
        .context("Failed to mark thought as tended")?;

    let resolution = match args.resolve {
        Some(r) => r,
        None => {
            let choice = prompt.choice("What would you like to do next?", &RESOLUTIONS)?;
            Resolution::from_choice(choice)
                .with_context(|| format!("Unknown resolution '{choice}'"))?
        }
    };
    let next = resolution.state();
    store
        .resolve_post_tend(id, next, None)
        .context("Failed to resolve thought")?;

    let (thought, _) = store.get(id)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&thought).unwrap_or_default()
        ),
        OutputFormat::Text => println!(
            "Tended #{id} ({} tends), now {next}",
            thought.tend_counter
        ),
    }
    Ok(())
}
