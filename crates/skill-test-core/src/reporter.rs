//! Test output reporter with cargo test-like formatting.

use crate::report::{format_run_usage, format_summary_line, format_total_usage};
use crate::types::{SuiteReport, TestOutcome};
use std::io::{self, Write};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Reporter configuration.
#[derive(Debug, Clone, Default)]
pub struct ReporterConfig {
    /// Use colors in output.
    pub color: bool,
    /// Print per-test and total usage lines.
    pub report_usage: bool,
}

/// Test reporter with cargo test-like output.
#[derive(Debug, Clone)]
pub struct Reporter {
    config: ReporterConfig,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub const fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.config.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn status(&self, passed: bool) -> String {
        if passed {
            self.paint("ok", GREEN)
        } else {
            self.paint("FAILED", RED)
        }
    }

    /// Print the start of a suite run.
    pub fn suite_start(&self, total: usize) {
        let noun = if total == 1 { "test" } else { "tests" };
        println!("running {total} {noun}");
        println!();
        self.flush();
    }

    /// Print the header line for a starting test.
    pub fn test_start(&self, label: &str) {
        println!("==> {label}");
        self.flush();
    }

    /// Format the result line(s) of a finished test.
    #[must_use]
    pub fn format_test_result(&self, outcome: &TestOutcome) -> String {
        let mut text = format!("test {} ... {}", outcome.label, self.status(outcome.passed));
        if self.config.report_usage {
            let usage = outcome
                .metrics
                .as_ref()
                .and_then(format_run_usage)
                .unwrap_or_else(|| "unavailable".to_string());
            text.push_str(&format!("\n    usage: {usage}"));
        }
        text
    }

    /// Print a test result line.
    pub fn test_result(&self, outcome: &TestOutcome) {
        println!("{}", self.format_test_result(outcome));
        self.flush();
    }

    /// Format the final verdict, the failure list, and the summary.
    #[must_use]
    pub fn format_final(&self, report: &SuiteReport) -> String {
        let mut lines = vec![String::new()];
        if report.passed() {
            lines.push(self.paint("PASS", GREEN));
        } else {
            lines.push(self.paint("FAIL", RED));
            lines.extend(report.failures.iter().map(|f| format!("- {f}")));
        }
        lines.push(String::new());
        lines.push(format!(
            "test result: {}. {}",
            self.status(report.passed()),
            format_summary_line(
                report.passed_count(),
                report.failed_count(),
                report.duration
            )
        ));
        if self.config.report_usage {
            let usage = format_total_usage(&report.usage)
                .unwrap_or_else(|| "unavailable".to_string());
            lines.push(format!("total usage: {usage}"));
        }
        lines.join("\n")
    }

    /// Print the final report.
    pub fn finish(&self, report: &SuiteReport) {
        println!("{}", self.format_final(report));
        self.flush();
    }

    /// Print an informational message.
    pub fn info(&self, message: &str) {
        println!("{message}");
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        eprintln!("{}: {message}", self.paint("error", RED));
    }

    /// Flush stdout.
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
