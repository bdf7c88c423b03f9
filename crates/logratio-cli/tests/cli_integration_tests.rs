//! CLI Integration Tests
//!
//! Tests for the `logratio` binary using `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SAMPLE_LOG: &str = "\
192.168.0.1 hGsd8sdk /admin 200 12
192.168.0.1 hGsd8sdk /user/contacts 400 7
10.0.0.5 lxY7nKxl /user/contacts 200 31
10.0.0.5 lxY7nKxl /messages 403 4
";

/// Get the CLI binary command, isolated from any local config or env overrides
#[allow(deprecated)]
fn logratio_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("logratio").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("LOGRATIO_REPORT__ROWS")
        .env_remove("LOGRATIO_PIPELINE__STORAGE");
    cmd
}

fn write_sample(dir: &TempDir) -> std::path::PathBuf {
    let input = dir.path().join("access.log");
    fs::write(&input, SAMPLE_LOG).unwrap();
    input
}

// =============================================================================
// Help & Usage Tests
// =============================================================================

#[test]
fn test_help_displays_usage() {
    let dir = TempDir::new().unwrap();
    logratio_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("error/success ratio"));
}

#[test]
fn test_version_displays_version() {
    let dir = TempDir::new().unwrap();
    logratio_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("logratio"));
}

#[test]
fn test_missing_arguments_print_usage_and_fail() {
    let dir = TempDir::new().unwrap();
    logratio_cmd(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: logratio <INPUT> <OUTPUT>"));
}

#[test]
fn test_only_input_is_not_enough() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(&dir);
    logratio_cmd(&dir)
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// =============================================================================
// Aggregation Tests
// =============================================================================

#[test]
fn test_observed_report_for_sample_log() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(&dir);
    let output = dir.path().join("report.tsv");

    logratio_cmd(&dir)
        .arg(&input)
        .arg(&output)
        .arg("--no-progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report Summary"))
        .stdout(predicate::str::contains("Rows with inf"));

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "UID\tendpoint\terror_ratio\n\
         hGsd8sdk\t/admin\t0\n\
         hGsd8sdk\t/user/contacts\tinf\n\
         lxY7nKxl\t/user/contacts\t0\n\
         lxY7nKxl\t/messages\tinf\n"
    );
}

#[test]
fn test_cross_product_report_for_sample_log() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(&dir);
    let output = dir.path().join("report.tsv");

    logratio_cmd(&dir)
        .arg(&input)
        .arg(&output)
        .args(["--no-progress", "--rows", "cross-product", "--storage", "dense"])
        .assert()
        .success();

    let report = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[1], "hGsd8sdk\t/admin\t0");
    assert_eq!(lines[3], "hGsd8sdk\t/messages\tinf");
    assert_eq!(lines[4], "lxY7nKxl\t/admin\tinf");
}

#[test]
fn test_precision_flag_rounds_ratios() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("access.log");
    fs::write(
        &input,
        "1.1.1.1 u /a 500 1\n1.1.1.1 u /a 200 1\n1.1.1.1 u /a 200 1\n1.1.1.1 u /a 200 1\n",
    )
    .unwrap();
    let output = dir.path().join("report.tsv");

    logratio_cmd(&dir)
        .arg(&input)
        .arg(&output)
        .args(["--no-progress", "--precision", "2"])
        .assert()
        .success();

    assert!(fs::read_to_string(&output)
        .unwrap()
        .ends_with("u\t/a\t0.33\n"));
}

#[test]
fn test_malformed_line_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("access.log");
    fs::write(&input, "1.1.1.1 u /a 200 1\n1.1.1.1 u\n").unwrap();
    let output = dir.path().join("report.tsv");

    logratio_cmd(&dir)
        .arg(&input)
        .arg(&output)
        .arg("--no-progress")
        .assert()
        .failure()
        .stderr(predicate::str::contains("LOGR-001"));

    assert!(!output.exists());
    assert!(!dir.path().join("report.tsv.partial").exists());
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    logratio_cmd(&dir)
        .arg(dir.path().join("missing.log"))
        .arg(dir.path().join("report.tsv"))
        .arg("--no-progress")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open input"));
}

#[test]
fn test_invalid_batch_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(&dir);

    logratio_cmd(&dir)
        .arg(&input)
        .arg(dir.path().join("report.tsv"))
        .args(["--no-progress", "--batch-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_oversized_batch_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(&dir);
    let output = dir.path().join("report.tsv");

    logratio_cmd(&dir)
        .arg(&input)
        .arg(&output)
        .args(["--no-progress", "--batch-size", "2305843009213693951"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("report.batch_size"));

    assert!(!output.exists());
}

#[test]
fn test_config_file_selects_cross_product() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(&dir);
    let output = dir.path().join("report.tsv");
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[report]\nrows = \"cross_product\"\n").unwrap();

    logratio_cmd(&dir)
        .arg(&input)
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .arg("--no-progress")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).unwrap().lines().count(), 7);
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(&dir);

    logratio_cmd(&dir)
        .arg(&input)
        .arg(dir.path().join("report.tsv"))
        .args(["--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

// =============================================================================
// Generate Command Tests
// =============================================================================

#[test]
fn test_generate_then_aggregate() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("synthetic.log");
    let output = dir.path().join("report.tsv");

    logratio_cmd(&dir)
        .arg("generate")
        .arg(&log)
        .args(["--lines", "2000", "--users", "10", "--endpoints", "5", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated"));

    assert_eq!(fs::read_to_string(&log).unwrap().lines().count(), 2000);

    logratio_cmd(&dir)
        .arg(&log)
        .arg(&output)
        .args(["--no-progress", "--rows", "cross-product"])
        .assert()
        .success();

    let rows = fs::read_to_string(&output).unwrap().lines().count() - 1;
    assert!(rows <= 50);
    assert!(rows > 0);
}

#[test]
fn test_generate_rejects_bad_error_rate() {
    let dir = TempDir::new().unwrap();

    logratio_cmd(&dir)
        .arg("generate")
        .arg(dir.path().join("x.log"))
        .args(["--error-rate", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--error-rate"));
}
