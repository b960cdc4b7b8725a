//! CLI application for listing-agreement field extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, extract, history, kyc, prompt, rules, tools};

/// Extract listing-agreement fields from emails and contracts
#[derive(Parser)]
#[command(name = "bitlist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract agreement fields from a single text file
    Extract(extract::ExtractArgs),

    /// Extract agreement fields from multiple files
    Batch(batch::BatchArgs),

    /// Convert an amount to upper-case English words
    Words(tools::WordsArgs),

    /// Normalize a date to "Month D, YYYY"
    Date(tools::DateArgs),

    /// Validate an agreement record stored as JSON
    Validate(tools::ValidateArgs),

    /// Extract KYC fields from review text
    Kyc(kyc::KycArgs),

    /// Show or clear saved extractions
    History(history::HistoryArgs),

    /// Manage the AI system prompt
    Prompt(prompt::PromptArgs),

    /// Export the extraction rules as Markdown
    Rules(rules::RulesArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Words(args) => tools::words(args),
        Commands::Date(args) => tools::date(args, config_path),
        Commands::Validate(args) => tools::validate(args, config_path),
        Commands::Kyc(args) => kyc::run(args, config_path).await,
        Commands::History(args) => history::run(args, config_path).await,
        Commands::Prompt(args) => prompt::run(args, config_path).await,
        Commands::Rules(args) => rules::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
