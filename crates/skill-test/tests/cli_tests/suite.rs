//! End-to-end suite runs against a fake agent script.
#![cfg(unix)]

use super::{TestResult, install_agent, skill_test, write_test_file};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Echoes the prompt in text mode; emits one `search` tool event with usage in
/// event mode; replies with a failing verdict when asked to grade.
const ECHO_AGENT: &str = r#"
case "$8" in
  "You are grading"*)
    printf '%s\n' '{"pass": false, "violations": ["no greeting"], "notes": "terse"}'
    exit 0
    ;;
esac
if [ "$3" = "json" ]; then
  printf '%s\n' '{"type": "tool_use", "tool": "search"}'
  printf '%s\n' '{"type": "step_finish", "cost": 0.5, "tokens": {"input": 120, "output": 30}}'
else
  printf '%s\n' "$8"
fi
"#;

const FAILING_AGENT: &str = r#"
echo "model not available" >&2
exit 3
"#;

fn echo_suite(test_json: &str) -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    install_agent(dir.path(), ECHO_AGENT)?;
    write_test_file(dir.path(), "echo", "basic.json", test_json)?;
    Ok(dir)
}

#[test]
fn test_passing_pattern() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi", "expect": {"must_match": ["hi"]}}"#)?;
    skill_test(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("==> echo/basic.json"))
        .stdout(predicate::str::contains("test echo/basic.json ... ok"))
        .stdout(predicate::str::contains("\nPASS\n"))
        .stdout(predicate::str::contains("1 passed; 0 failed"));
    Ok(())
}

#[test]
fn test_missing_pattern_fails() -> TestResult {
    let dir = echo_suite(
        r#"{"skill": "echo", "prompt": "say hi", "expect": {"must_match": ["goodbye"]}}"#,
    )?;
    skill_test(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("test echo/basic.json ... FAILED"))
        .stdout(predicate::str::contains("\nFAIL\n"))
        .stdout(predicate::str::contains(
            "- echo/basic.json: missing pattern: goodbye",
        ));
    Ok(())
}

#[test]
fn test_required_tool_present() -> TestResult {
    let dir = echo_suite(
        r#"{"skill": "echo", "prompt": "look it up", "expect": {"must_tool": ["search"]}}"#,
    )?;
    skill_test(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS"));
    Ok(())
}

#[test]
fn test_forbidden_tool_fails() -> TestResult {
    let dir = echo_suite(
        r#"{"skill": "echo", "prompt": "look it up", "expect": {"must_not_tool": ["search"]}}"#,
    )?;
    skill_test(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            r#"- echo/basic.json: forbidden tool call: search (saw: ["search"])"#,
        ));
    Ok(())
}

#[test]
fn test_skill_filter_without_match() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi"}"#)?;
    skill_test(dir.path())
        .args(["--skill", "other"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching skill tests found."));
    Ok(())
}

#[test]
fn test_skill_filter_selects_tests() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi"}"#)?;
    write_test_file(
        dir.path(),
        "other",
        "basic.json",
        r#"{"skill": "other", "prompt": "x", "expect": {"must_match": ["never"]}}"#,
    )?;
    skill_test(dir.path())
        .args(["--skill", "echo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("==> echo/basic.json"))
        .stdout(predicate::str::contains("other/basic.json").not());
    Ok(())
}

#[test]
fn test_malformed_test_file_is_load_error() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo"}"#)?;
    skill_test(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing required field: prompt"));
    Ok(())
}

#[test]
fn test_agent_failure_is_run_failure() -> TestResult {
    let dir = TempDir::new()?;
    install_agent(dir.path(), FAILING_AGENT)?;
    write_test_file(
        dir.path(),
        "echo",
        "basic.json",
        r#"{"skill": "echo", "prompt": "say hi", "expect": {"must_match": ["hi"]}}"#,
    )?;
    skill_test(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "- echo/basic.json: run failed: agent failed (exit 3)",
        ))
        .stdout(predicate::str::contains("missing pattern").not());
    Ok(())
}

#[test]
fn test_report_usage() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi", "expect": {"must_match": ["hi"]}}"#)?;
    skill_test(dir.path())
        .arg("--report-usage")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "usage: cost $0.5000, input tokens 120, output tokens 30",
        ))
        .stdout(predicate::str::contains("total usage: cost $0.5000"));
    Ok(())
}

#[test]
fn test_judge_rejection() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi", "judge": {"enabled": true}}"#)?;
    fs::write(dir.path().join("skills/echo/SKILL.md"), "Always greet warmly.\n")?;
    skill_test(dir.path())
        .arg("--enable-judge")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            r#"- echo/basic.json: judge rejected output: ["no greeting"] (notes: terse)"#,
        ));
    Ok(())
}

#[test]
fn test_judge_ignored_without_flag() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi", "judge": {"enabled": true}}"#)?;
    skill_test(dir.path()).assert().success();
    Ok(())
}

#[test]
fn test_judge_missing_skill_file() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi", "judge": {"enabled": true}}"#)?;
    skill_test(dir.path())
        .arg("--enable-judge")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("echo/basic.json: missing skill file: "))
        .stdout(predicate::str::contains("SKILL.md"));
    Ok(())
}

#[test]
fn test_json_format() -> TestResult {
    let dir = echo_suite(
        r#"{"skill": "echo", "prompt": "say hi", "expect": {"must_match": ["bye"], "must_tool": ["search"]}}"#,
    )?;
    let output = skill_test(dir.path())
        .args(["--format", "json"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));

    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["passed"], false);
    assert_eq!(json["failed_tests"], 1);
    assert_eq!(json["outcomes"][0]["label"], "echo/basic.json");
    assert_eq!(json["outcomes"][0]["metrics"]["tools"][0], "search");
    assert_eq!(json["failures"][0]["kind"], "missing_pattern");
    assert!(json["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
    Ok(())
}

#[test]
fn test_verbose_table() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi"}"#)?;
    skill_test(dir.path())
        .args(["--verbose", "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Input Tokens"))
        .stdout(predicate::str::contains("echo/basic.json"))
        .stdout(predicate::str::contains("\x1b[").not());
    Ok(())
}

#[test]
fn test_color_always() -> TestResult {
    let dir = echo_suite(r#"{"skill": "echo", "prompt": "say hi"}"#)?;
    skill_test(dir.path())
        .args(["--color", "always"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[32mok\x1b[0m"));
    Ok(())
}
