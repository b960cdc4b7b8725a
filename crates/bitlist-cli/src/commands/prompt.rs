//! Prompt command - show, replace or reset the AI system prompt.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use bitlist_core::store::{load_prompt, reset_prompt, save_prompt};

use super::{load_config, open_store, read_input};

/// Arguments for the prompt command.
#[derive(Args)]
pub struct PromptArgs {
    #[command(subcommand)]
    command: PromptCommand,
}

#[derive(Subcommand)]
enum PromptCommand {
    /// Print the active prompt
    Show,

    /// Store a custom prompt
    Set {
        /// Prompt text
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the prompt from a file, or `-` for stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Restore the built-in prompt
    Reset,
}

pub async fn run(args: PromptArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    match args.command {
        PromptCommand::Show => {
            println!("{}", load_prompt(&store)?);
        }
        PromptCommand::Set { text, file } => {
            let prompt = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => read_input(&file.to_string_lossy())?,
                (None, None) => anyhow::bail!("Provide the prompt text or --file"),
            };
            if prompt.trim().is_empty() {
                anyhow::bail!("Prompt is empty");
            }
            save_prompt(&store, prompt.trim())?;
            println!("{} Custom prompt saved", style("✓").green());
        }
        PromptCommand::Reset => {
            reset_prompt(&store)?;
            println!("{} Prompt reset to default", style("✓").green());
        }
    }

    Ok(())
}
