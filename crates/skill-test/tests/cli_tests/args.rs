//! CLI argument tests (no agent required).

use super::{TestResult, binary_path, skill_test};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_arg_help() {
    assert_cmd::Command::new(binary_path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Behavior test runner for agent skills",
        ));
}

#[test]
fn test_arg_version() {
    assert_cmd::Command::new(binary_path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skill-test"));
}

#[test]
fn test_arg_model_required() {
    assert_cmd::Command::new(binary_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--model"));
}

#[test]
fn test_arg_invalid_format() -> TestResult {
    let dir = TempDir::new()?;
    skill_test(dir.path())
        .args(["--format", "csv"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid format"));
    Ok(())
}

#[test]
fn test_arg_invalid_color() -> TestResult {
    let dir = TempDir::new()?;
    skill_test(dir.path())
        .args(["--color", "rainbow"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid color"));
    Ok(())
}

#[test]
fn test_arg_zero_timeout_rejected() -> TestResult {
    let dir = TempDir::new()?;
    skill_test(dir.path())
        .args(["--timeout-s", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("timeout must be greater than zero"));
    Ok(())
}

#[test]
fn test_no_tests_found() -> TestResult {
    let dir = TempDir::new()?;
    skill_test(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No skill tests found."));
    Ok(())
}

#[test]
fn test_unknown_config_key_rejected() -> TestResult {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("skill-test.config.yaml"), "iterations: 3\n")?;
    skill_test(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("YAML parse error"));
    Ok(())
}
