//! Assertion evaluation against a run's text output and tool list.

use crate::types::{Expectations, Failure, FailureKind};
use regex::{Regex, RegexBuilder};

/// Compile an output pattern.
///
/// Patterns are case-sensitive; `^`/`$` match at line boundaries and `.` matches
/// newlines.
///
/// # Errors
/// Returns the regex error if the pattern is invalid.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
}

/// Evaluate `must_match` and `must_not_match` against the text output.
#[must_use]
pub fn evaluate_patterns(label: &str, expect: &Expectations, output: &str) -> Vec<Failure> {
    let mut failures = Vec::new();

    for pattern in &expect.must_match {
        match compile_pattern(pattern) {
            Ok(re) if !re.is_match(output) => failures.push(Failure::new(
                label,
                FailureKind::MissingPattern,
                format!("missing pattern: {pattern}"),
            )),
            Ok(_) => {}
            Err(e) => failures.push(invalid_pattern(label, pattern, &e)),
        }
    }

    for pattern in &expect.must_not_match {
        match compile_pattern(pattern) {
            Ok(re) if re.is_match(output) => failures.push(Failure::new(
                label,
                FailureKind::ForbiddenPattern,
                format!("forbidden pattern matched: {pattern}"),
            )),
            Ok(_) => {}
            Err(e) => failures.push(invalid_pattern(label, pattern, &e)),
        }
    }

    failures
}

fn invalid_pattern(label: &str, pattern: &str, error: &regex::Error) -> Failure {
    Failure::new(
        label,
        FailureKind::InvalidPattern,
        format!("invalid pattern: {pattern} ({error})"),
    )
}

/// Evaluate `must_tool` and `must_not_tool` against the observed tool list.
#[must_use]
pub fn evaluate_tools(label: &str, expect: &Expectations, tools: &[String]) -> Vec<Failure> {
    let mut failures = Vec::new();

    for tool in &expect.must_tool {
        if !tools.contains(tool) {
            failures.push(Failure::new(
                label,
                FailureKind::MissingTool,
                format!("missing tool call: {tool} (saw: {tools:?})"),
            ));
        }
    }

    for tool in &expect.must_not_tool {
        if tools.contains(tool) {
            failures.push(Failure::new(
                label,
                FailureKind::ForbiddenTool,
                format!("forbidden tool call: {tool} (saw: {tools:?})"),
            ));
        }
    }

    failures
}

/// Evaluate all four expectation sets. Every check runs; nothing short-circuits.
#[must_use]
pub fn evaluate_expectations(
    label: &str,
    expect: &Expectations,
    output: &str,
    tools: &[String],
) -> Vec<Failure> {
    let mut failures = evaluate_patterns(label, expect, output);
    failures.extend(evaluate_tools(label, expect, tools));
    failures
}
