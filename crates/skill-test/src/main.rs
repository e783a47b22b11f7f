//! skill-test CLI - Behavior test runner for agent skills.

use clap::Parser;
use comfy_table::{Cell, Color, Table};
use skill_test_core::{
    ColorMode, ConfigOverrides, ProgressEvent, ReportFormat, Reporter, ReporterConfig,
    SuiteReport, format_report_json, prepare_suite, run_suite, timestamp_now,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Exit codes for the CLI.
mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const TESTS_FAILED: u8 = 1;
    pub const CONFIG_ERROR: u8 = 2;
}

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SKILL_TEST_LOG";

#[derive(Parser)]
#[command(name = "skill-test")]
#[command(about = "Behavior test runner for agent skills")]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Model used for test runs
    #[arg(long)]
    model: String,

    /// Model used for judge checks (default: --model)
    #[arg(long)]
    eval_model: Option<String>,

    /// Agent name to use for runs (default: build)
    #[arg(long)]
    agent: Option<String>,

    /// Only run tests for this skill name
    #[arg(long)]
    skill: Option<String>,

    /// Enable LLM-as-judge checks for tests that have judge.enabled=true
    #[arg(long)]
    enable_judge: bool,

    /// Per-test timeout in seconds (default: 600)
    #[arg(long)]
    timeout_s: Option<u64>,

    /// Color output: auto, always, never
    #[arg(long, default_value = "auto")]
    color: String,

    /// Capture event streams to report cost and token usage
    #[arg(long)]
    report_usage: bool,

    /// Output format: table, json
    #[arg(long, default_value = "table")]
    format: String,

    /// Print a per-test results table
    #[arg(short, long)]
    verbose: bool,

    /// Repository root holding skill-test.config.yaml and the skills tree
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    run_command(&cli).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_results_table(report: &SuiteReport, color: bool) {
    let mut table = Table::new();
    table.set_header(vec![
        "Test",
        "Status",
        "Duration",
        "Cost",
        "Input Tokens",
        "Output Tokens",
    ]);

    for outcome in &report.outcomes {
        let status = if outcome.passed {
            Cell::new("Pass")
        } else {
            Cell::new("Fail")
        };
        let status = match (color, outcome.passed) {
            (false, _) => status,
            (true, true) => status.fg(Color::Green),
            (true, false) => status.fg(Color::Red),
        };
        let metrics = outcome.metrics.as_ref();
        let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&outcome.label),
            status,
            Cell::new(format!("{:.1}s", outcome.duration.as_secs_f64())),
            Cell::new(or_dash(metrics.and_then(|m| m.cost).map(|c| format!("${c:.4}")))),
            Cell::new(or_dash(
                metrics.and_then(|m| m.input_tokens).map(|t| t.to_string()),
            )),
            Cell::new(or_dash(
                metrics.and_then(|m| m.output_tokens).map(|t| t.to_string()),
            )),
        ]);
    }

    println!("{table}");
}

async fn run_command(cli: &Cli) -> ExitCode {
    let color_mode: ColorMode = match cli.color.parse() {
        Ok(mode) => mode,
        Err(e) => {
            Reporter::new(ReporterConfig::default()).error(&format!("Invalid color: {e}"));
            return ExitCode::from(exit_code::CONFIG_ERROR);
        }
    };
    let color = color_mode.enabled(io::stdout().is_terminal());
    let reporter = Reporter::new(ReporterConfig {
        color,
        report_usage: cli.report_usage,
    });

    let report_format: ReportFormat = match cli.format.parse() {
        Ok(f) => f,
        Err(e) => {
            reporter.error(&format!("Invalid format: {e}"));
            return ExitCode::from(exit_code::CONFIG_ERROR);
        }
    };

    let overrides = ConfigOverrides {
        eval_model: cli.eval_model.clone(),
        agent: cli.agent.clone(),
        skill_filter: cli.skill.clone(),
        enable_judge: cli.enable_judge,
        report_usage: cli.report_usage,
        timeout_s: cli.timeout_s,
    };

    let suite = match prepare_suite(&cli.root, &cli.model, &overrides) {
        Ok(suite) => suite,
        Err(e) => {
            reporter.error(&e.to_string());
            return ExitCode::from(exit_code::CONFIG_ERROR);
        }
    };

    if suite.discovered == 0 {
        reporter.info("No skill tests found.");
        return ExitCode::from(exit_code::SUCCESS);
    }
    if suite.tests.is_empty() {
        reporter.info("No matching skill tests found.");
        return ExitCode::from(exit_code::SUCCESS);
    }

    let show_progress = report_format == ReportFormat::Table;
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressEvent>();

    let printer = reporter.clone();
    let progress_handle = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            if !show_progress {
                continue;
            }
            match event {
                ProgressEvent::SuiteStarted { total_tests } => printer.suite_start(total_tests),
                ProgressEvent::TestStarted { label, .. } => printer.test_start(&label),
                ProgressEvent::TestCompleted { outcome, .. } => printer.test_result(&outcome),
            }
        }
    });

    let report = run_suite(&suite.tests, &suite.config, &suite.agent, Some(&progress_tx)).await;
    drop(progress_tx);
    let _ = progress_handle.await;

    match report_format {
        ReportFormat::Json => {
            println!("{}", format_report_json(&report, &timestamp_now()));
        }
        ReportFormat::Table => {
            reporter.finish(&report);
            if cli.verbose {
                println!();
                print_results_table(&report, color);
            }
        }
    }

    if report.passed() {
        ExitCode::from(exit_code::SUCCESS)
    } else {
        ExitCode::from(exit_code::TESTS_FAILED)
    }
}
