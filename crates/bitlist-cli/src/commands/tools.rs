//! Small single-value commands: amount words, date normalization, record validation.

use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;

use bitlist_core::validation::date_warning;
use bitlist_core::{normalize_date_with_today, number_to_words, validate_record, AgreementRecord, FieldKey};

use super::load_config;

#[derive(Args)]
pub struct WordsArgs {
    /// Amount, e.g. "90,000"
    amount: String,
}

#[derive(Args)]
pub struct DateArgs {
    /// Raw date text, e.g. "11/2/26"
    raw: String,

    /// Reference date for ambiguous dates (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// JSON file holding an agreement record
    input: PathBuf,

    /// Reference date for date warnings (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
}

pub fn words(args: WordsArgs) -> anyhow::Result<()> {
    let words = number_to_words(&args.amount);
    if words.is_empty() {
        anyhow::bail!("Cannot convert {:?} to words", args.amount);
    }
    println!("{}", words);
    Ok(())
}

pub fn date(args: DateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let today = args
        .today
        .or(config.extraction.today)
        .unwrap_or_else(|| Local::now().date_naive());
    println!("{}", normalize_date_with_today(&args.raw, today));
    Ok(())
}

pub fn validate(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let today = args
        .today
        .or(config.extraction.today)
        .unwrap_or_else(|| Local::now().date_naive());

    let content = fs::read_to_string(&args.input)?;
    let record: AgreementRecord = serde_json::from_str(&content)?;

    for key in [FieldKey::SignDate, FieldKey::ListingDate] {
        if let Some(warning) = date_warning(record.get(key), today) {
            println!("{} {}: {}", style("⚠").yellow(), key, warning);
        }
    }

    let report = validate_record(&record);
    if report.is_valid() {
        println!("{} All fields valid", style("✓").green());
        return Ok(());
    }

    for (key, hint) in report.issues() {
        println!(
            "{} {} = {:?}: expected {}",
            style("✗").red(),
            key,
            record.get(key),
            hint
        );
    }
    anyhow::bail!("{} invalid field(s)", report.issues().len())
}
