//! Rules command - export extraction rules and correction logs as Markdown.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use bitlist_core::render::rules_markdown;
use bitlist_core::store::OptimizationLog;

use super::{load_config, open_store};

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave out stored correction logs
    #[arg(long)]
    no_logs: bool,
}

pub async fn run(args: RulesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let logs = if args.no_logs {
        Vec::new()
    } else {
        let config = load_config(config_path)?;
        let store = open_store(&config)?;
        OptimizationLog::new(&store).list()?
    };

    let markdown = rules_markdown(&logs);

    if let Some(output_path) = &args.output {
        fs::write(output_path, &markdown)?;
        println!(
            "{} Rules written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", markdown);
    }

    Ok(())
}
