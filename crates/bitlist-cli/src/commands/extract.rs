//! Extract command - pull agreement fields from a single text file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use tracing::{debug, info};

use bitlist_core::models::config::BitlistConfig;
use bitlist_core::validation::date_warning;
use bitlist_core::{
    validate_record, AgreementExtractor, AgreementRecord, ExtractionResult, FieldKey, History,
    HistoryKind, RegexAgreementParser,
};

use super::{load_config, open_store, read_input};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input text file, or `-` for stdin
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print the full editable record instead of the raw extraction
    #[arg(long)]
    record: bool,

    /// Reference date for ambiguous dates (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Only use labeled values, skip keyword and shape fallbacks
    #[arg(long)]
    no_fallbacks: bool,

    /// Validate extracted data
    #[arg(long)]
    validate: bool,

    /// Save the result to history
    #[arg(long)]
    save_history: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let text = read_input(&args.input)?;
    if text.trim().is_empty() {
        anyhow::bail!("Input is empty: {}", args.input);
    }

    info!("Extracting fields from {}", args.input);

    let today = args
        .today
        .or(config.extraction.today)
        .unwrap_or_else(|| Local::now().date_naive());
    let parser = build_parser(&config, today, args.no_fallbacks);
    let result = parser.extract(&text);
    let record = to_record(&result, today);

    if args.validate {
        print_validation(&record, today);
    }

    if args.save_history {
        let store = open_store(&config)?;
        let item = History::new(&store)
            .with_max_items(config.store.max_history)
            .add(HistoryKind::Listing, &text, &record)?;
        debug!("Saved history entry {}", item.id);
    }

    let output = if args.record {
        format_record(&record, args.format)?
    } else {
        format_result(&result, args.format)?
    };

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

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Parser configured from the config file and command-line overrides.
pub fn build_parser(config: &BitlistConfig, today: NaiveDate, no_fallbacks: bool) -> RegexAgreementParser {
    let parser = RegexAgreementParser::from_config(&config.extraction).with_today(today);
    if no_fallbacks {
        parser.with_fallbacks(false)
    } else {
        parser
    }
}

/// Merge an extraction into a fresh record, deriving missing amount words.
pub fn to_record(result: &ExtractionResult, today: NaiveDate) -> AgreementRecord {
    let mut record = AgreementRecord::new(today);
    record.merge(&result.fields);
    record.include_technical_fee = result.technical_fee;

    for key in [FieldKey::Amount, FieldKey::MarketingAmount] {
        let Some(words_key) = key.words_counterpart() else {
            continue;
        };
        if record.get(words_key).is_empty() && !record.get(key).is_empty() {
            let amount = record.get(key).to_string();
            record.set_field(key, amount);
        }
    }

    record
}

fn print_validation(record: &AgreementRecord, today: NaiveDate) {
    let report = validate_record(record);
    let warnings: Vec<_> = [FieldKey::SignDate, FieldKey::ListingDate]
        .into_iter()
        .filter_map(|key| date_warning(record.get(key), today).map(|w| (key, w)))
        .collect();

    if report.is_valid() && warnings.is_empty() {
        eprintln!("{} All fields valid", style("✓").green());
        return;
    }

    if !report.is_valid() {
        eprintln!("{}", style("Validation issues:").yellow());
        for (key, hint) in report.issues() {
            eprintln!("  - {}: expected {}", key, hint);
        }
    }
    for (key, warning) in warnings {
        eprintln!("  {} {}: {}", style("⚠").yellow(), key, warning);
    }
}

fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(
            FieldKey::ALL.map(|key| result.fields.get(key).unwrap_or_default()),
            result.technical_fee,
        ),
        OutputFormat::Text => Ok(format_text(
            FieldKey::ALL.map(|key| result.fields.get(key).unwrap_or_default()),
            result.technical_fee,
            &result.warnings,
        )),
    }
}

fn format_record(record: &AgreementRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(
            FieldKey::ALL.map(|key| record.get(key)),
            record.include_technical_fee,
        ),
        OutputFormat::Text => Ok(format_text(
            FieldKey::ALL.map(|key| record.get(key)),
            record.include_technical_fee,
            &[],
        )),
    }
}

/// One header row plus one value row, columns in field order.
pub fn format_csv(values: [&str; 13], technical_fee: bool) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = FieldKey::ALL.iter().map(|key| key.as_str()).collect();
    header.push("includeTechnicalFee");
    wtr.write_record(&header)?;

    let fee = technical_fee.to_string();
    let mut row: Vec<&str> = values.to_vec();
    row.push(&fee);
    wtr.write_record(&row)?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(values: [&str; 13], technical_fee: bool, warnings: &[String]) -> String {
    let mut output = String::new();

    for (key, value) in FieldKey::ALL.iter().zip(values) {
        let shown = if value.is_empty() { "-" } else { value };
        output.push_str(&format!("{}: {}\n", key.description(), shown.replace('\n', "\n    ")));
    }

    output.push_str(&format!(
        "\nTechnical fee: {}\n",
        if technical_fee { "included" } else { "waived" }
    ));

    if !warnings.is_empty() {
        output.push('\n');
        for warning in warnings {
            output.push_str(&format!("! {}\n", warning));
        }
    }

    output
}
