//! Text rendering of records and Markdown export of the extraction rules.

use chrono::{DateTime, Utc};

use crate::extraction::rules::patterns::FIELD_LABELS;
use crate::extraction::rules::COUNTRY_KEYWORDS;
use crate::models::agreement::{AgreementRecord, FieldKey};
use crate::store::OptimizationLogEntry;
use crate::validation::VALIDATION_RULES;

/// Logs included in the rules export.
const MAX_EXPORTED_LOGS: usize = 20;

/// English label that the label patterns map back to this field only.
pub fn canonical_label(key: FieldKey) -> &'static str {
    match key {
        FieldKey::Company => "Company Name",
        FieldKey::Jurisdiction => "Jurisdiction",
        FieldKey::Address => "Registered Address",
        FieldKey::SignDate => "Agreement Date",
        FieldKey::ListingDate => "Listing Date",
        FieldKey::Token => "Token Ticker",
        FieldKey::Amount => "Listing Fee Amount",
        FieldKey::AmountInWords => "Amount in Words",
        FieldKey::SignName => "Signer Name",
        FieldKey::MarketingAmount => "Marketing Fee Amount",
        FieldKey::MarketingInWords => "Marketing Fee in Words",
        FieldKey::TradingPair => "Trading Pair",
        FieldKey::Wallets => "Wallet Address",
    }
}

/// Render a record as `Label: value` lines that extract back to the same record.
///
/// Empty fields are skipped. A multi-line wallet value is written as bare
/// address lines, since a label only captures to the end of its line.
pub fn render_labeled_text(record: &AgreementRecord) -> String {
    let mut out = String::new();

    for (key, value) in record.iter() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if key == FieldKey::Wallets && value.contains('\n') {
            for line in value.lines().map(str::trim).filter(|l| !l.is_empty()) {
                out.push_str(line);
                out.push('\n');
            }
            continue;
        }
        out.push_str(&format!("{}: {}\n", canonical_label(key), value));
    }

    out
}

fn cell(text: &str) -> String {
    text.replace('|', r"\|").replace('\n', "<br>")
}

/// Export the label tables, country keywords and validation rules as Markdown.
pub fn rules_markdown(logs: &[OptimizationLogEntry]) -> String {
    rules_markdown_at(logs, Utc::now())
}

/// [`rules_markdown`] with a fixed generation time.
pub fn rules_markdown_at(logs: &[OptimizationLogEntry], generated: DateTime<Utc>) -> String {
    let mut md = String::new();
    md.push_str("# Listing Agreement Extraction Rules\n");
    md.push_str(&format!("> Generated: {}\n\n", generated.format("%Y-%m-%d %H:%M:%S")));

    md.push_str("## 1. Field Labels\n\n");
    md.push_str(
        "Each label is matched at the start of a line, case-insensitively, followed by `:` or `：`. \
         Labels are tried in order and the first one that yields a value wins.\n\n",
    );
    for (key, labels) in FIELD_LABELS {
        md.push_str(&format!("### {} ({})\n", key.as_str(), key.description()));
        md.push_str("| # | Label |\n|---|---|\n");
        for (i, label) in labels.iter().enumerate() {
            md.push_str(&format!("| {} | `{}` |\n", i + 1, cell(label)));
        }
        md.push('\n');
    }

    md.push_str("## 2. Jurisdiction Keywords\n\n");
    md.push_str(
        "When no jurisdiction label matches, the address and full text are searched for these keywords in order:\n\n",
    );
    md.push_str("| Keyword | Country |\n|---|---|\n");
    for (keyword, country) in COUNTRY_KEYWORDS {
        md.push_str(&format!("| {} | {} |\n", cell(keyword), cell(country)));
    }
    md.push('\n');

    md.push_str("## 3. Validation Rules\n\n");
    md.push_str("| Field | Pattern | Expected |\n|---|---|---|\n");
    for rule in VALIDATION_RULES {
        md.push_str(&format!(
            "| {} | `{}` | {} |\n",
            rule.field.as_str(),
            cell(rule.pattern),
            cell(rule.hint)
        ));
    }
    md.push('\n');

    md.push_str("## 4. Normalization\n\n");
    md.push_str("- Amounts: currency symbols and commas are dropped, `k`/`M` suffixes are multiplied out\n");
    md.push_str("- Dates: rendered as `Month D, YYYY`; ambiguous numeric dates resolve to the nearest upcoming reading\n");
    md.push_str("- Tokens: quotes removed, first word upper-cased\n");
    md.push_str("- Technical fee: included unless the text mentions a waiver\n\n");

    if !logs.is_empty() {
        md.push_str("## 5. Correction Logs (Recent)\n\n");
        for log in logs.iter().take(MAX_EXPORTED_LOGS) {
            let when = DateTime::<Utc>::from_timestamp_millis(log.timestamp)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| log.timestamp.to_string());
            md.push_str(&format!("### Log {when}\n"));
            if !log.diffs.is_empty() {
                md.push_str("| Field | Extracted | Corrected |\n|---|---|---|\n");
                for diff in &log.diffs {
                    md.push_str(&format!(
                        "| {} | {} | {} |\n",
                        diff.field.as_str(),
                        or_empty(&diff.ai_value),
                        or_empty(&diff.user_value)
                    ));
                }
            }
            if !log.suggestion.is_empty() {
                let lang = if serde_json::from_str::<serde_json::Value>(&log.suggestion).is_ok() {
                    "json"
                } else {
                    "text"
                };
                md.push_str(&format!("\n**Suggestion:**\n```{lang}\n{}\n```\n", log.suggestion));
            }
            md.push_str("\n---\n\n");
        }
    }

    md
}

fn or_empty(value: &str) -> String {
    if value.is_empty() {
        "(empty)".to_string()
    } else {
        cell(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldDiff;
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;

    fn record() -> AgreementRecord {
        AgreementRecord::new(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap())
    }

    #[test]
    fn test_render_skips_empty_fields() {
        let mut r = record();
        r.company = "Ado Network SRL".to_string();
        r.token = "ADO".to_string();
        assert_eq!(
            render_labeled_text(&r),
            "Company Name: Ado Network SRL\nAgreement Date: February 13, 2026\nToken Ticker: ADO\n"
        );
    }

    #[test]
    fn test_render_multi_line_wallets() {
        let mut r = record();
        r.signdate.clear();
        r.wallets = "0xabc\n\n  Tabc  ".to_string();
        assert_eq!(render_labeled_text(&r), "0xabc\nTabc\n");
    }

    #[test]
    fn test_rules_markdown_sections() {
        let md = rules_markdown_at(&[], Utc.with_ymd_and_hms(2026, 2, 13, 9, 30, 0).unwrap());
        assert!(md.contains("> Generated: 2026-02-13 09:30:00"));
        assert!(md.contains("### company (Company Name / 公司名称)"));
        assert!(md.contains(r"| 1 | `company\s*名称` |"));
        assert!(md.contains("| tortola | British Virgin Islands |"));
        assert!(md.contains(r"(January\|February"));
        assert!(!md.contains("## 5."));
    }

    #[test]
    fn test_rules_markdown_logs_are_capped() {
        let entry = OptimizationLogEntry {
            id: "1".to_string(),
            timestamp: 0,
            diffs: vec![FieldDiff {
                field: FieldKey::Token,
                ai_value: String::new(),
                user_value: "ADO".to_string(),
            }],
            suggestion: String::new(),
            email_snippet: String::new(),
        };
        let logs = vec![entry; 25];
        let md = rules_markdown(&logs);
        assert_eq!(md.matches("### Log 1970-01-01 00:00:00").count(), MAX_EXPORTED_LOGS);
        assert!(md.contains("| token | (empty) | ADO |"));
    }

    #[test]
    fn test_rules_markdown_log_layout() {
        let diffs = vec![FieldDiff {
            field: FieldKey::Token,
            ai_value: "ADO".to_string(),
            user_value: "ADOX".to_string(),
        }];
        let analysed = OptimizationLogEntry {
            id: "2".to_string(),
            timestamp: 1_770_975_000_000,
            diffs: diffs.clone(),
            suggestion: r#"{"summary": "ticker suffix"}"#.to_string(),
            email_snippet: String::new(),
        };
        let offline = OptimizationLogEntry {
            id: "1".to_string(),
            timestamp: 0,
            diffs,
            suggestion: "AI analysis unavailable.".to_string(),
            email_snippet: String::new(),
        };
        let md = rules_markdown(&[analysed, offline]);
        let logs = &md[md.find("## 5.").unwrap()..];
        assert_eq!(
            logs,
            "## 5. Correction Logs (Recent)\n\n\
             ### Log 2026-02-13 09:30:00\n\
             | Field | Extracted | Corrected |\n|---|---|---|\n\
             | token | ADO | ADOX |\n\
             \n**Suggestion:**\n```json\n{\"summary\": \"ticker suffix\"}\n```\n\
             \n---\n\n\
             ### Log 1970-01-01 00:00:00\n\
             | Field | Extracted | Corrected |\n|---|---|---|\n\
             | token | ADO | ADOX |\n\
             \n**Suggestion:**\n```text\nAI analysis unavailable.\n```\n\
             \n---\n\n"
        );
    }
}
