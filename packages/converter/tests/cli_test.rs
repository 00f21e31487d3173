//! Tests for the `qtisheet` binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture_bank() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("test_bank")
}

fn qtisheet() -> Command {
    Command::new(env!("CARGO_BIN_EXE_qtisheet"))
}

#[test]
fn test_convert_single_workbook() {
    let out = tempdir().unwrap();
    let path = out.path().join("bank.xlsx");

    qtisheet()
        .arg("convert")
        .arg(fixture_bank())
        .arg("-o")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Chapter_2: 7 rows"))
        .stdout(predicate::str::contains("Chapter_10: 4 rows"))
        .stdout(predicate::str::contains("Saved to:"));

    assert!(path.exists());
}

#[test]
fn test_convert_independent_reports_existing() {
    let out = tempdir().unwrap();
    std::fs::write(out.path().join("Chapter_2.xlsx"), b"existing").unwrap();

    qtisheet()
        .args(["convert", "--mode", "independent", "-o"])
        .arg(out.path())
        .arg(fixture_bank())
        .assert()
        .success()
        .stdout(predicate::str::contains("Already exists:"));

    assert!(out.path().join("Chapter_10.xlsx").exists());
}

#[test]
fn test_convert_missing_input_fails() {
    qtisheet()
        .args(["convert", "/nonexistent/bank"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid input"));
}

#[test]
fn test_convert_empty_bank_fails() {
    let bank = tempdir().unwrap();
    let out = tempdir().unwrap();

    qtisheet()
        .arg("convert")
        .arg(bank.path())
        .arg("-o")
        .arg(out.path().join("bank.xlsx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No chapter directories"));
}

#[test]
fn test_inspect_json() {
    qtisheet()
        .arg("inspect")
        .arg(fixture_bank().join("Chapter_2").join("Q10_True_False.xml"))
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"choiceText\": \"True\""))
        .stdout(predicate::str::contains("\"identifier\": \"sky_blue\""));
}

#[test]
fn test_inspect_plain() {
    qtisheet()
        .arg("inspect")
        .arg(fixture_bank().join("Chapter_10").join("Q1_Multiple_Choice.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Row 4"))
        .stdout(predicate::str::contains("choiceText: Everest"));
}
