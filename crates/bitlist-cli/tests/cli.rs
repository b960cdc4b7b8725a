use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_EMAIL: &str = "\
Hi team, please find our details below.

1. Company Name: Ado Network SRL
2. Registered Address: Str. Exemplu 12, Bucuresti, Romania
3. Token Ticker: \"ado\"
4. Listing Fee Amount: $90k (inclusive of VAT)
5. Latest Listing Date: 11/2/26
6. Signer Name: Andrei Popescu
7. Marketing Fee: 30,000 USDT
8. Trading Pair: ADO/USDT
Wallet Address: 0x52908400098527886E0F7030069857D2E4169EE7
";

/// Temp dir holding a config whose store lives in the same dir.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let config = serde_json::json!({
        "extraction": { "today": "2026-02-13" },
        "store": { "data_dir": dir.path() },
    });
    fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    (dir, config_path)
}

fn bitlist(config_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bitlist").unwrap();
    cmd.arg("-c").arg(config_path);
    cmd
}

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("email.txt");
    fs::write(&path, SAMPLE_EMAIL).unwrap();
    path
}

#[test]
fn test_words() {
    let (_dir, config) = workspace();
    bitlist(&config)
        .args(["words", "123,456"])
        .assert()
        .success()
        .stdout("ONE HUNDRED TWENTY THREE THOUSAND FOUR HUNDRED FIFTY SIX\n");

    bitlist(&config)
        .args(["words", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot convert"));
}

#[test]
fn test_date_uses_configured_today() {
    let (_dir, config) = workspace();
    bitlist(&config)
        .args(["date", "11/2/26"])
        .assert()
        .success()
        .stdout("November 2, 2026\n");

    bitlist(&config)
        .args(["date", "3/1/2025", "--today", "2026-02-13"])
        .assert()
        .success()
        .stdout("March 1, 2025\n");
}

#[test]
fn test_extract_json() {
    let (dir, config) = workspace();
    let input = write_sample(dir.path());

    bitlist(&config)
        .arg("extract")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"company\": \"Ado Network SRL\""))
        .stdout(predicate::str::contains("\"jurisdiction\": \"Romania\""))
        .stdout(predicate::str::contains("\"listingdate\": \"November 2, 2026\""))
        .stdout(predicate::str::contains("\"technical_fee\": true"));
}

#[test]
fn test_extract_record_fills_words() {
    let (dir, config) = workspace();
    let input = write_sample(dir.path());

    bitlist(&config)
        .args(["extract", "--record"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"amountInWords\": \"NINETY THOUSAND\""))
        .stdout(predicate::str::contains("\"marketinginwords\": \"THIRTY THOUSAND\""))
        .stdout(predicate::str::contains("\"signdate\": \"February 13, 2026\""));
}

#[test]
fn test_extract_csv_from_stdin() {
    let (_dir, config) = workspace();
    bitlist(&config)
        .args(["extract", "-", "--format", "csv"])
        .write_stdin(SAMPLE_EMAIL)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "company,jurisdiction,address,signdate,listingdate,token,amount,amountInWords,",
        ))
        .stdout(predicate::str::contains("Ado Network SRL,Romania,"));
}

#[test]
fn test_extract_missing_file() {
    let (dir, config) = workspace();
    bitlist(&config)
        .arg("extract")
        .arg(dir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_validate_record() {
    let (dir, config) = workspace();
    let good = dir.path().join("good.json");
    fs::write(
        &good,
        r#"{"company": "Ado Network SRL", "token": "ADO", "signdate": "February 13, 2026"}"#,
    )
    .unwrap();
    bitlist(&config)
        .arg("validate")
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("All fields valid"));

    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"token": "btc1", "amount": "90k"}"#).unwrap();
    bitlist(&config)
        .arg("validate")
        .arg(&bad)
        .assert()
        .failure()
        .stdout(predicate::str::contains("token"))
        .stdout(predicate::str::contains("amount"));
}

#[test]
fn test_kyc() {
    let (_dir, config) = workspace();
    bitlist(&config)
        .args(["kyc", "-"])
        .write_stdin("Account ID: 12345\n- Name: John Smith\nCountry\nKenya\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"account_id\": \"12345\""))
        .stdout(predicate::str::contains("\"name\": \"John Smith\""))
        .stdout(predicate::str::contains("\"country\": \"Kenya\""));
}

#[test]
fn test_history_round_trip() {
    let (dir, config) = workspace();
    let input = write_sample(dir.path());

    bitlist(&config)
        .args(["extract", "--save-history"])
        .arg(&input)
        .assert()
        .success();
    bitlist(&config)
        .args(["kyc", "--save-history", "-"])
        .write_stdin("Name: John Smith")
        .assert()
        .success();

    bitlist(&config)
        .args(["history", "list", "--json", "--kind", "listing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"listing\""))
        .stdout(predicate::str::contains("\"type\": \"kyc\"").not());

    bitlist(&config).args(["history", "clear"]).assert().success();
    bitlist(&config)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No history entries"));
}

/// Save the sample extraction to history and return its entry.
fn saved_extraction(dir: &Path, config: &Path) -> serde_json::Value {
    let input = write_sample(dir);
    bitlist(config)
        .args(["extract", "--save-history"])
        .arg(&input)
        .assert()
        .success();

    let output = bitlist(config)
        .args(["history", "list", "--json"])
        .output()
        .unwrap();
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    items[0].clone()
}

/// Write the saved record with the token changed to `ADOX`.
fn write_corrected(dir: &Path, entry: &serde_json::Value) -> PathBuf {
    let mut record = entry["outputData"].clone();
    record["token"] = serde_json::json!("ADOX");
    let path = dir.join("corrected.json");
    fs::write(&path, record.to_string()).unwrap();
    path
}

#[test]
fn test_history_correction_appears_in_rules() {
    let (dir, config) = workspace();
    let entry = saved_extraction(dir.path(), &config);
    let id = entry["id"].as_str().unwrap();
    let corrected = write_corrected(dir.path(), &entry);

    bitlist(&config)
        .args(["history", "correct", &id[..8]])
        .arg(&corrected)
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged 1 corrected field(s)"))
        .stdout(predicate::str::contains("token: \"ADO\" -> \"ADOX\""));

    let output = dir.path().join("rules.md");
    bitlist(&config)
        .args(["rules", "--output"])
        .arg(&output)
        .assert()
        .success();
    let markdown = fs::read_to_string(&output).unwrap();
    assert!(markdown.contains("## 5. Correction Logs (Recent)"));
    assert!(markdown.contains("| token | ADO | ADOX |"));
    assert!(markdown.contains("```text\nAI analysis unavailable. Diffs:"));

    bitlist(&config)
        .args(["rules", "--no-logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## 5.").not());
}

#[test]
fn test_history_correction_with_analysis_reply() {
    let (dir, config) = workspace();
    let entry = saved_extraction(dir.path(), &config);
    let id = entry["id"].as_str().unwrap();
    let corrected = write_corrected(dir.path(), &entry);

    let reply = dir.path().join("reply.json");
    fs::write(
        &reply,
        r#"```json
{"suggestions": [{"field": "token", "issue": "suffix dropped", "fix": "keep the full ticker"}], "summary": "ticker suffix"}
```"#,
    )
    .unwrap();

    bitlist(&config)
        .args(["history", "correct", id])
        .arg(&corrected)
        .arg("--analysis")
        .arg(&reply)
        .assert()
        .success();

    bitlist(&config)
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("```json"))
        .stdout(predicate::str::contains("\"summary\": \"ticker suffix\""));
}

#[test]
fn test_history_correction_without_changes_or_entry() {
    let (dir, config) = workspace();
    let entry = saved_extraction(dir.path(), &config);
    let id = entry["id"].as_str().unwrap();
    let unchanged = dir.path().join("unchanged.json");
    fs::write(&unchanged, entry["outputData"].to_string()).unwrap();

    bitlist(&config)
        .args(["history", "correct", id])
        .arg(&unchanged)
        .assert()
        .success()
        .stdout(predicate::str::contains("No corrections to log"));

    bitlist(&config)
        .args(["history", "correct", "ffffffff"])
        .arg(&unchanged)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No history entry matches"));
}

#[test]
fn test_history_correction_prints_analysis_requests() {
    let (dir, config) = workspace();
    let entry = saved_extraction(dir.path(), &config);
    let id = entry["id"].as_str().unwrap();
    let corrected = write_corrected(dir.path(), &entry);

    bitlist(&config)
        .args(["history", "correct", id, "--print-request"])
        .arg(&corrected)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API key configured"));

    bitlist(&config)
        .args(["config", "set", "ai.api_key", "test-key"])
        .assert()
        .success();
    bitlist(&config)
        .args(["history", "correct", id, "--print-request"])
        .arg(&corrected)
        .assert()
        .success()
        .stdout(predicate::str::contains("https://api.openai.com/v1/chat/completions"))
        .stdout(predicate::str::contains("gemini-2.5-pro"))
        .stdout(predicate::str::contains("User corrected to"))
        .stdout(predicate::str::contains("test-key").not());
}

#[test]
fn test_prompt_set_and_reset() {
    let (_dir, config) = workspace();
    bitlist(&config)
        .args(["prompt", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Return ONLY raw JSON"));

    bitlist(&config)
        .args(["prompt", "set", "Extract everything."])
        .assert()
        .success();
    bitlist(&config)
        .args(["prompt", "show"])
        .assert()
        .success()
        .stdout("Extract everything.\n");

    bitlist(&config).args(["prompt", "reset"]).assert().success();
    bitlist(&config)
        .args(["prompt", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Return ONLY raw JSON"));
}

#[test]
fn test_rules_export() {
    let (dir, config) = workspace();
    let output = dir.path().join("rules.md");
    bitlist(&config)
        .args(["rules", "--output"])
        .arg(&output)
        .assert()
        .success();

    let markdown = fs::read_to_string(&output).unwrap();
    assert!(markdown.contains("## 1. Field Labels"));
    assert!(markdown.contains("| bucuresti | Romania |"));
}

#[test]
fn test_config_init_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.json");

    bitlist(&config).args(["config", "init"]).assert().success();
    assert!(config.exists());

    bitlist(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    bitlist(&config)
        .args(["config", "set", "extraction.use_fallbacks", "false"])
        .assert()
        .success();
    bitlist(&config)
        .args(["config", "get", "extraction.use_fallbacks"])
        .assert()
        .success()
        .stdout("false\n");

    bitlist(&config)
        .args(["config", "get", "extraction.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_batch_summary() {
    let (dir, config) = workspace();
    let inputs = dir.path().join("inputs");
    fs::create_dir_all(&inputs).unwrap();
    fs::write(inputs.join("a.txt"), SAMPLE_EMAIL).unwrap();
    fs::write(inputs.join("b.txt"), "Company: Beta Labs Ltd\nToken: BETA\n").unwrap();
    let out = dir.path().join("out");

    let pattern = format!("{}/*.txt", inputs.display());
    bitlist(&config)
        .args(["batch", &pattern, "--summary", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files to process"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,company,token"));
    assert!(summary.contains("a.txt,success,Ado Network SRL,ADO,90000,\"November 2, 2026\",Romania"));
    assert!(summary.contains("b.txt,success,Beta Labs Ltd,BETA"));
}
