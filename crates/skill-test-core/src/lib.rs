//! Core library for skill-test CLI.
//!
//! This crate provides the core functionality for behavior-testing agent skills:
//! - Test case discovery and loading from JSON
//! - Tolerant extraction of tool names and usage from agent event streams
//! - Assertion evaluation (output patterns, required/forbidden tools)
//! - LLM-as-judge grading against the skill text
//! - Sequential suite orchestration and reporting

pub mod agent;
pub mod assertion;
pub mod config;
pub mod judge;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod scanner;
pub mod stream;
pub mod tools;
pub mod types;

pub use agent::{AgentError, AgentRequest, AgentRunner, CliAgent, OutputFormat};
pub use assertion::{compile_pattern, evaluate_expectations, evaluate_patterns, evaluate_tools};
pub use config::{
    CONFIG_FILE_NAME, ConfigError, ConfigOverrides, FileConfig, SuiteConfig, load_config,
    load_file_config, resolve_config,
};
pub use judge::{
    JudgeError, JudgeInput, JudgeSettings, build_judge_prompt, parse_verdict, run_judge,
};
pub use loader::{
    LoaderError, discover_test_files, filter_by_skill, load_suite, load_test_case,
    parse_test_case,
};
pub use metrics::{EventUsage, extract_usage};
pub use report::{ColorMode, ReportFormat, format_report_json, timestamp_now};
pub use reporter::{Reporter, ReporterConfig};
pub use runner::{
    PreparedSuite, ProgressEvent, ProgressSender, RunnerError, TestPlan, prepare_suite,
    run_suite, run_test,
};
pub use scanner::walk;
pub use stream::{aggregate_events, decode_events, event_metrics};
pub use tools::extract_tool_names;
pub use types::*;
