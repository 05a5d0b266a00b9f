use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use peony_core::{CoreError, ErrorKind};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod editor;
mod output;
mod prompt;

#[derive(Parser)]
#[command(
    name = "peony",
    version,
    about = "A calm holding space for unfinished thoughts"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        commands::Commands::Add(args) => commands::add::run(args, cli.format),
        commands::Commands::View(args) => commands::view::run(args, cli.format),
        commands::Commands::Tend(args) => commands::tend::run(args, cli.format),
        commands::Commands::Stats => commands::stats::run(cli.format),
        commands::Commands::Config(args) => commands::config::run(args, cli.format),
        commands::Commands::Purge(args) => commands::purge::run(args),
        commands::Commands::Reindex(args) => commands::reindex::run(args),
        commands::Commands::Version => commands::version::run(cli.format),
    }
}

/// 2 validation, 3 not found, 4 invalid transition, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<CoreError>())
        .map(CoreError::kind);
    match kind {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::InvalidTransition) => 4,
        Some(ErrorKind::Storage | ErrorKind::Config) | None => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_follows_error_kind() {
        let not_found: Result<()> = Err::<(), _>(CoreError::NotFound {
            op: "get",
            what: "thought 3".into(),
        })
        .context("Failed to load thought");
        assert_eq!(exit_code(&not_found.unwrap_err()), 3);

        let invalid = anyhow::Error::new(CoreError::InvalidTransition {
            op: "mark_tended",
            id: 1,
            reason: "terminal".into(),
        });
        assert_eq!(exit_code(&invalid), 4);

        let bad_input = anyhow::Error::new(CoreError::Validation {
            op: "create",
            reason: "content is empty".into(),
        });
        assert_eq!(exit_code(&bad_input), 2);

        assert_eq!(exit_code(&anyhow::anyhow!("editor exited")), 1);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
