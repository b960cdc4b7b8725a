//! History command - list, clear or correct saved extractions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use clap::{Args, Subcommand};
use console::style;
use serde_json::json;
use tracing::info;

use bitlist_core::ai::{parse_analysis_response, AiConfig};
use bitlist_core::models::config::BitlistConfig;
use bitlist_core::store::{diff_records, load_prompt, OptimizationLog};
use bitlist_core::{AgreementRecord, ExtractionError, FileStore, History, HistoryKind};

use super::{load_config, open_store};

/// Arguments for the history command.
#[derive(Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    command: HistoryCommand,
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List saved extractions, newest first
    List {
        /// Only show one kind of entry
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove all saved extractions
    Clear,

    /// Log the corrections made to a saved listing extraction
    Correct(CorrectArgs),
}

#[derive(Args)]
struct CorrectArgs {
    /// History entry id, or a unique prefix of it
    id: String,

    /// JSON file holding the record as finally kept
    record: PathBuf,

    /// Model reply to the analysis request, stored as the suggestion
    #[arg(long)]
    analysis: Option<PathBuf>,

    /// Print the analysis request for each model in the fallback chain instead of logging
    #[arg(long, conflicts_with = "analysis")]
    print_request: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum KindArg {
    Listing,
    Kyc,
}

impl From<KindArg> for HistoryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Listing => HistoryKind::Listing,
            KindArg::Kyc => HistoryKind::Kyc,
        }
    }
}

pub async fn run(args: HistoryArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let history = History::new(&store).with_max_items(config.store.max_history);

    match args.command {
        HistoryCommand::List { kind, json } => {
            let items = match kind {
                Some(kind) => history.list_by_kind(kind.into())?,
                None => history.list()?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
                return Ok(());
            }

            if items.is_empty() {
                println!("{} No history entries", style("ℹ").blue());
                return Ok(());
            }

            for item in &items {
                let when = DateTime::<Utc>::from_timestamp_millis(item.timestamp)
                    .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let kind = match item.kind {
                    HistoryKind::Listing => "listing",
                    HistoryKind::Kyc => "kyc",
                };
                let preview: String = item
                    .input_text
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .chars()
                    .take(60)
                    .collect();
                let short_id: String = item.id.chars().take(8).collect();
                println!("{} [{}] {}  {}", style(short_id).dim(), kind, when, preview);
            }
        }
        HistoryCommand::Clear => {
            history.clear()?;
            println!("{} History cleared", style("✓").green());
        }
        HistoryCommand::Correct(correct_args) => {
            correct(correct_args, &config, &store, &history)?;
        }
    }

    Ok(())
}

fn correct(
    args: CorrectArgs,
    config: &BitlistConfig,
    store: &FileStore,
    history: &History<&FileStore>,
) -> anyhow::Result<()> {
    let Some(item) = history.find(&args.id)? else {
        anyhow::bail!("No history entry matches {}", args.id);
    };
    let Some(extracted) = item.listing_fields()? else {
        anyhow::bail!("History entry {} is not a listing extraction", args.id);
    };
    let user = read_record(&args.record)?;

    if args.print_request {
        let diffs = diff_records(&extracted, &user);
        let prompt = load_prompt(store)?;
        let requests = AiConfig::from(&config.ai)
            .chain()
            .iter()
            .map(|ai| -> Result<serde_json::Value, ExtractionError> {
                let request = ai.build_analysis_request(&item.input_text, &diffs, &prompt)?;
                Ok(json!({ "url": request.url, "body": request.body }))
            })
            .collect::<Result<Vec<_>, ExtractionError>>()?;
        println!("{}", serde_json::to_string_pretty(&requests)?);
        return Ok(());
    }

    let suggestion = match &args.analysis {
        Some(path) => {
            let reply = fs::read_to_string(path)?;
            Some(parse_analysis_response(&reply)?.to_suggestion())
        }
        None => None,
    };

    let log = OptimizationLog::new(store).with_max_items(config.store.max_history);
    match log.record_correction(&item.input_text, &extracted, &user, suggestion.as_deref())? {
        Some(entry) => {
            info!("Logged correction {} for history entry {}", entry.id, item.id);
            println!(
                "{} Logged {} corrected field(s)",
                style("✓").green(),
                entry.diffs.len()
            );
            for diff in &entry.diffs {
                println!("  {}: {:?} -> {:?}", diff.field, diff.ai_value, diff.user_value);
            }
        }
        None => println!("{} No corrections to log", style("ℹ").blue()),
    }

    Ok(())
}

fn read_record(path: &Path) -> anyhow::Result<AgreementRecord> {
    if !path.exists() {
        anyhow::bail!("Record file not found: {}", path.display());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
