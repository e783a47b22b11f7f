//! Report output formats.

use crate::types::{RunMetrics, SuiteReport, UsageTotals};
use serde::Serialize;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

/// Output format for the final report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown format: {s}. Valid formats: table, json")),
        }
    }
}

/// When to color terminal output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolve to a yes/no decision given whether stdout is a terminal.
    ///
    /// `auto` colors only a terminal and honors `NO_COLOR`.
    #[must_use]
    pub fn enabled(self, is_terminal: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => is_terminal && std::env::var_os("NO_COLOR").is_none(),
        }
    }
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err(format!("unknown color mode: {s}. Valid modes: auto, always, never")),
        }
    }
}

/// JSON document printed by `--format json`.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub timestamp: String,
    pub passed: bool,
    pub passed_tests: usize,
    pub failed_tests: usize,
    #[serde(flatten)]
    pub report: &'a SuiteReport,
}

/// Current UTC time as RFC 3339 with millisecond precision.
#[must_use]
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Format a suite report as pretty JSON.
#[must_use]
pub fn format_report_json(report: &SuiteReport, timestamp: &str) -> String {
    let doc = JsonReport {
        timestamp: timestamp.to_string(),
        passed: report.passed(),
        passed_tests: report.passed_count(),
        failed_tests: report.failed_count(),
        report,
    };
    serde_json::to_string_pretty(&doc).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Format the closing summary line.
#[must_use]
pub fn format_summary_line(passed: usize, failed: usize, duration: Duration) -> String {
    format!(
        "{passed} passed; {failed} failed; finished in {:.1}s",
        duration.as_secs_f64()
    )
}

/// Format optional usage fields; `None` when nothing was reported.
#[must_use]
pub fn format_usage(
    cost: Option<f64>,
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(cost) = cost {
        parts.push(format!("cost ${cost:.4}"));
    }
    if let Some(tokens) = input_tokens {
        parts.push(format!("input tokens {tokens}"));
    }
    if let Some(tokens) = output_tokens {
        parts.push(format!("output tokens {tokens}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Usage of one run, or `None` when the run reported none.
#[must_use]
pub fn format_run_usage(metrics: &RunMetrics) -> Option<String> {
    format_usage(metrics.cost, metrics.input_tokens, metrics.output_tokens)
}

/// Usage summed over a suite, or `None` when no test reported any.
#[must_use]
pub fn format_total_usage(totals: &UsageTotals) -> Option<String> {
    format_usage(totals.cost, totals.input_tokens, totals.output_tokens)
}
