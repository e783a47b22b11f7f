//! Core data types for skill-test.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Expectations declared by a test case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectations {
    /// Patterns that must match the text output.
    pub must_match: Vec<String>,
    /// Patterns that must not match the text output.
    pub must_not_match: Vec<String>,
    /// Tool names that must appear in the event stream.
    pub must_tool: Vec<String>,
    /// Tool names that must not appear in the event stream.
    pub must_not_tool: Vec<String>,
}

impl Expectations {
    /// Whether any pattern expectation is declared.
    #[must_use]
    pub fn has_patterns(&self) -> bool {
        !self.must_match.is_empty() || !self.must_not_match.is_empty()
    }

    /// Whether any tool expectation is declared.
    #[must_use]
    pub fn has_tools(&self) -> bool {
        !self.must_tool.is_empty() || !self.must_not_tool.is_empty()
    }
}

/// A loaded test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Path of the definition file.
    pub path: PathBuf,
    pub skill: String,
    pub prompt: String,
    pub expect: Expectations,
    /// Whether the test opts into judge evaluation.
    pub use_judge: bool,
}

impl TestCase {
    /// Label used to tag failures: `<skill>/<file name>`.
    #[must_use]
    pub fn label(&self) -> String {
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned());
        format!("{}/{file_name}", self.skill)
    }
}

/// Aggregated signal recovered from one run's event stream.
///
/// Absent numeric fields mean no signal was found, which is distinct from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Distinct tool names in first-seen order.
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

impl RunMetrics {
    /// Merge `other` into `self`.
    ///
    /// Tool lists union in first-seen order; numeric fields keep the maximum,
    /// with an absent value acting as identity.
    pub fn merge(&mut self, other: &Self) {
        for tool in &other.tools {
            if !self.tools.contains(tool) {
                self.tools.push(tool.clone());
            }
        }
        self.cost = max_option(self.cost, other.cost, f64::max);
        self.input_tokens = max_option(self.input_tokens, other.input_tokens, u64::max);
        self.output_tokens = max_option(self.output_tokens, other.output_tokens, u64::max);
    }

    /// Consuming form of [`RunMetrics::merge`].
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.merge(other);
        self
    }
}

fn max_option<T: Copy>(a: Option<T>, b: Option<T>, max: impl Fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(max(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Usage summed across the tests of a suite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

impl UsageTotals {
    /// Add one run's usage to the totals.
    pub fn add(&mut self, metrics: &RunMetrics) {
        self.cost = sum_option(self.cost, metrics.cost, |a, b| a + b);
        self.input_tokens = sum_option(self.input_tokens, metrics.input_tokens, u64::saturating_add);
        self.output_tokens =
            sum_option(self.output_tokens, metrics.output_tokens, u64::saturating_add);
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cost.is_none() && self.input_tokens.is_none() && self.output_tokens.is_none()
    }
}

fn sum_option<T: Copy>(a: Option<T>, b: Option<T>, add: impl Fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(add(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Verdict returned by the judge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JudgeVerdict {
    pub pass: bool,
    pub violations: Vec<String>,
    pub notes: String,
}

/// Class of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The agent invocation itself failed.
    Run,
    MissingPattern,
    ForbiddenPattern,
    InvalidPattern,
    /// The event-stream invocation failed after the text run succeeded.
    EventCapture,
    MissingTool,
    ForbiddenTool,
    MissingSkillFile,
    /// The judge could not produce a verdict.
    JudgeError,
    /// The judge produced a failing verdict.
    JudgeVerdict,
}

/// A single failure, tagged with the label of the test that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub label: String,
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    #[must_use]
    pub fn new(label: &str, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.message)
    }
}

/// Append-only list of failures for one suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FailureLog {
    entries: Vec<Failure>,
}

impl FailureLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, failure: Failure) {
        self.entries.push(failure);
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = Failure>) {
        self.entries.extend(failures);
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Failure> {
        self.entries.iter()
    }
}

/// Outcome of one test case.
///
/// `passed` comes from the test's own failure list, never from matching labels in
/// the suite log: two files may share a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    pub label: String,
    pub skill: String,
    pub passed: bool,
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
    /// Metrics from the event-stream run, when one happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RunMetrics>,
}

/// Result of a whole suite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuiteReport {
    pub outcomes: Vec<TestOutcome>,
    pub failures: FailureLog,
    pub usage: UsageTotals,
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
}

impl SuiteReport {
    /// The suite passes when no failure was recorded.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_duration_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
