use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STATEMENT: &str = "\
Txn Date,Narration,Amt,Cr/Dr
2024-01-05,SWIGGY ORDER,450,DR
2024-01-31,SALARY CREDIT,50000,CR
2024-02-10,UPI/AMAZON/123,1200,DR
";

fn cashraaga(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cashraaga").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn write_statement(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

const MAPPING: [&str; 8] = [
    "--date",
    "Txn Date",
    "--description",
    "Narration",
    "--amount",
    "Amt",
    "--type-col",
    "Cr/Dr",
];

#[test]
fn test_columns_lists_headers_and_type_values() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", STATEMENT);
    cashraaga(dir.path())
        .args(["columns", file.to_str().unwrap(), "--type-col", "Cr/Dr"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Txn Date, Narration, Amt, Cr/Dr"))
        .stdout(predicate::str::contains("SWIGGY ORDER"))
        .stdout(predicate::str::contains("DR, CR"));
}

#[test]
fn test_analyze_prints_every_section() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", STATEMENT);
    cashraaga(dir.path())
        .arg("analyze")
        .arg(&file)
        .args(MAPPING)
        .assert()
        .success()
        .stdout(predicate::str::contains("Statement Overview"))
        .stdout(predicate::str::contains("₹48,350"))
        .stdout(predicate::str::contains("Food & Dining"))
        .stdout(predicate::str::contains("Recent Transactions"))
        .stdout(predicate::str::contains("at least 3 months"));
}

#[test]
fn test_analyze_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", STATEMENT);
    let output = cashraaga(dir.path())
        .arg("analyze")
        .arg(&file)
        .args(MAPPING)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["monthly"][0]["month"], "2024-01");
    assert_eq!(value["monthly"][0]["savings"], 49550.0);
    assert_eq!(value["monthly"][1]["savings"], -1200.0);
    assert_eq!(value["transactions"][0]["category"], "Food & Dining");
    assert_eq!(value["forecast"]["status"], "insufficient_history");
}

#[test]
fn test_report_monthly() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", STATEMENT);
    cashraaga(dir.path())
        .args(["report", "monthly"])
        .arg(&file)
        .args(MAPPING)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01"))
        .stdout(predicate::str::contains("₹49,550"))
        .stdout(predicate::str::contains("-₹1,200"));
}

#[test]
fn test_report_upi_and_emi() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", STATEMENT);
    cashraaga(dir.path())
        .args(["report", "upi"])
        .arg(&file)
        .args(MAPPING)
        .assert()
        .success()
        .stdout(predicate::str::contains("UPI/AMAZON/123"));
    cashraaga(dir.path())
        .args(["report", "emi"])
        .arg(&file)
        .args(MAPPING)
        .assert()
        .success()
        .stdout(predicate::str::contains("No EMI or loan debits found."));
}

#[test]
fn test_report_forecast_with_history() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(
        &dir,
        "s.csv",
        "Date,Description,Amount\n\
         2024-01-01,SALARY,50000\n2024-01-09,RENT,-15000\n\
         2024-02-01,SALARY,50000\n2024-02-09,RENT,-22000\n\
         2024-03-01,SALARY,52000\n2024-03-15,SWIGGY,-4000\n\
         2024-04-01,SALARY,52000\n2024-04-20,EMI HDFC,-30000\n",
    );
    cashraaga(dir.path())
        .args(["report", "forecast"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Savings Forecast"))
        .stdout(predicate::str::contains("Month +3"));
}

#[test]
fn test_export_writes_default_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", STATEMENT);
    cashraaga(dir.path())
        .current_dir(dir.path())
        .arg("export")
        .arg(&file)
        .args(MAPPING)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 transactions"));
    let content =
        std::fs::read_to_string(dir.path().join("cashraaga_analysed_statement.csv")).unwrap();
    assert!(content.starts_with("Date,Description,Amount,Category\n"));
    assert!(content.contains("2024-02-10,UPI/AMAZON/123,-1200,Shopping"));
}

#[test]
fn test_export_monthly() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", STATEMENT);
    let out = dir.path().join("monthly.csv");
    cashraaga(dir.path())
        .arg("export")
        .arg(&file)
        .args(MAPPING)
        .arg("--monthly")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    let content = std::fs::read_to_string(out).unwrap();
    assert_eq!(
        content,
        "Month,Total Inflow,Total Outflow,Savings\n2024-01,50000,450,49550\n2024-02,0,1200,-1200\n"
    );
}

#[test]
fn test_unknown_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", STATEMENT);
    cashraaga(dir.path())
        .arg("analyze")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Unknown column: Date"));
}

#[test]
fn test_header_only_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", "Date,Description,Amount\n");
    cashraaga(dir.path())
        .arg("analyze")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn test_no_valid_rows_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_statement(&dir, "s.csv", "Date,Description,Amount\nyesterday,X,abc\n");
    cashraaga(dir.path())
        .arg("analyze")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid rows"));
}

#[test]
fn test_config_init_and_show() {
    let dir = tempfile::tempdir().unwrap();
    cashraaga(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("showing defaults"))
        .stdout(predicate::str::contains("\"credit_token\": \"CR\""));
    cashraaga(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default settings"));
    assert!(dir.path().join(".config/cashraaga/settings.json").exists());
    cashraaga(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exist"));
}

#[test]
fn test_settings_change_currency_and_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join(".config").join("cashraaga");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(
        config.join("settings.json"),
        r#"{"currency_symbol": "Rs.", "credit_token": "C", "debit_token": "D"}"#,
    )
    .unwrap();
    let file = write_statement(
        &dir,
        "s.csv",
        "Date,Description,Amount,Type\n2024-01-05,SWIGGY,450,D\n2024-01-31,SALARY,50000,C\n",
    );
    cashraaga(dir.path())
        .args(["report", "overview"])
        .arg(&file)
        .args(["--type-col", "Type"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rs.49,550"));
}

#[test]
fn test_month_first_overrides_day_first_setting() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join(".config").join("cashraaga");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(config.join("settings.json"), r#"{"day_first": true}"#).unwrap();
    let file = write_statement(
        &dir,
        "s.csv",
        "Date,Description,Amount\n02/05/2024,SALARY,50000\n",
    );
    cashraaga(dir.path())
        .args(["report", "monthly"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-05"));
    cashraaga(dir.path())
        .args(["report", "monthly", "--month-first"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-02"));
}
