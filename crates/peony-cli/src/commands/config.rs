use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use peony_core::storage::resolve_db_path;
use peony_core::{CoreError, PeonyConfig, SettleDuration};

use super::load_config;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective settings and file locations
    Show,
    /// Set the editor command used by `tend` (empty to clear)
    SetEditor {
        /// Command line, e.g. "code --wait" or "nvim"
        command: String,
    },
    /// Set how long thoughts rest before they can be tended (e.g. 18h, 1h30m, 2d)
    SetSettle {
        duration: String,
    },
}

pub fn run(args: &ConfigArgs, format: OutputFormat) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show(format),
        ConfigAction::SetEditor { command } => {
            let mut config = load_config();
            config.editor = Some(command.clone());
            let config = save(config)?;
            match config.editor.as_deref() {
                Some(editor) => println!("Editor set to '{editor}'."),
                None => println!("Editor cleared; $VISUAL, $EDITOR or nano/vim/vi will be used."),
            }
            Ok(())
        }
        ConfigAction::SetSettle { duration } => {
            let settle: SettleDuration = duration.parse().map_err(|e: CoreError| {
                CoreError::Validation {
                    op: "config set-settle",
                    reason: e.to_string(),
                }
            })?;
            let mut config = load_config();
            config.settle_duration = settle.to_string();
            save(config)?;
            println!("Settle duration set to {settle}.");
            Ok(())
        }
    }
}

fn save(config: PeonyConfig) -> Result<PeonyConfig> {
    let config = config.normalize();
    config.save().context("Failed to save config")?;
    Ok(config)
}

fn show(format: OutputFormat) -> Result<()> {
    let config = load_config();
    let config_path = PeonyConfig::path()?;
    let db_path = resolve_db_path()?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "config": config,
                "configPath": config_path,
                "databasePath": db_path,
            }))?
        ),
        OutputFormat::Text => {
            println!("Config file:     {}", config_path.display());
            println!("Database:        {}", db_path.display());
            println!(
                "Editor:          {}",
                config
                    .editor
                    .as_deref()
                    .unwrap_or("(auto: $VISUAL, $EDITOR, nano, vim, vi)")
            );
            println!("Settle duration: {}", config.settle_duration());
        }
    }
    Ok(())
}
