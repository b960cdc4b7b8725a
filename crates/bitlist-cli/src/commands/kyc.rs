//! KYC command - extract identity-review fields from text.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{debug, info};

use bitlist_core::{extract_kyc_fields, History, HistoryKind};

use super::{load_config, open_store, read_input};

/// Arguments for the kyc command.
#[derive(Args)]
pub struct KycArgs {
    /// Input text file, or `-` for stdin
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save the result to history
    #[arg(long)]
    save_history: bool,
}

pub async fn run(args: KycArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let text = read_input(&args.input)?;

    let fields = extract_kyc_fields(&text);
    info!("Extracted {} KYC fields", fields.len());

    if fields.is_empty() {
        eprintln!("{} No KYC fields found", style("⚠").yellow());
    }

    if args.save_history {
        let store = open_store(&config)?;
        let item = History::new(&store)
            .with_max_items(config.store.max_history)
            .add(HistoryKind::Kyc, &text, &fields)?;
        debug!("Saved history entry {}", item.id);
    }

    let output = serde_json::to_string_pretty(&fields)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}
