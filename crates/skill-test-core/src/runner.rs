//! Suite orchestration: invoke the agent per test, evaluate, record.

use crate::agent::{AgentError, AgentRequest, AgentRunner, CliAgent, OutputFormat};
use crate::assertion::evaluate_expectations;
use crate::config::{ConfigError, ConfigOverrides, SuiteConfig, load_config};
use crate::judge::{
    JudgeError, JudgeInput, JudgeSettings, describe_rejection, load_skill_text, run_judge,
};
use crate::loader::{LoaderError, filter_by_skill, load_suite};
use crate::stream::aggregate_events;
use crate::types::{Failure, FailureKind, RunMetrics, SuiteReport, TestCase, TestOutcome};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Progress events emitted during a suite run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The suite is starting.
    SuiteStarted { total_tests: usize },
    /// A test has started.
    TestStarted { label: String, skill: String },
    /// A test has completed.
    TestCompleted {
        outcome: TestOutcome,
        failures: Vec<Failure>,
    },
}

/// Sender for progress events.
pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Errors that keep a suite from starting.
///
/// Once a suite runs, every problem is recorded as a [`Failure`] instead.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Loader(#[from] LoaderError),
    #[error("{0}")]
    Agent(#[from] AgentError),
}

/// A suite ready to run.
#[derive(Debug)]
pub struct PreparedSuite {
    pub config: SuiteConfig,
    /// Tests left after the skill filter.
    pub tests: Vec<TestCase>,
    /// Number of test files discovered before filtering.
    pub discovered: usize,
    pub agent: CliAgent,
}

/// Resolve configuration, load every test under the skills directory and apply the
/// skill filter.
///
/// # Errors
/// Returns an error if the configuration is invalid or any test file fails to load.
pub fn prepare_suite(
    root: &Path,
    model: &str,
    overrides: &ConfigOverrides,
) -> Result<PreparedSuite, RunnerError> {
    let config = load_config(root, model, overrides)?;
    let all = load_suite(&config.skills_dir, None)?;
    let discovered = all.len();
    let tests = filter_by_skill(all, config.skill_filter.as_deref());
    let agent = CliAgent::new(config.agent_command.clone())?;
    Ok(PreparedSuite {
        config,
        tests,
        discovered,
        agent,
    })
}

/// Which invocations a test needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestPlan {
    pub needs_text: bool,
    pub needs_events: bool,
    pub judge: bool,
}

impl TestPlan {
    #[must_use]
    pub fn for_test(test: &TestCase, config: &SuiteConfig) -> Self {
        let judge = config.enable_judge && test.use_judge;
        let needs_events = test.expect.has_tools() || config.report_usage;
        let needs_text = test.expect.has_patterns() || judge || !needs_events;
        Self {
            needs_text,
            needs_events,
            judge,
        }
    }
}

fn request(test: &TestCase, config: &SuiteConfig, format: OutputFormat) -> AgentRequest {
    AgentRequest {
        model: config.model.clone(),
        agent: config.agent.clone(),
        prompt: test.prompt.clone(),
        format,
        config_dir: config.config_dir.clone(),
        timeout: config.timeout,
    }
}

fn run_failure(label: &str, error: &AgentError) -> Failure {
    Failure::new(label, FailureKind::Run, format!("run failed: {error}"))
}

/// Run one test case.
///
/// Never fails: every problem becomes a [`Failure`] tagged with the test's label.
pub async fn run_test<A: AgentRunner>(
    test: &TestCase,
    config: &SuiteConfig,
    agent: &A,
) -> (TestOutcome, Vec<Failure>) {
    let started = Instant::now();
    let label = test.label();
    let plan = TestPlan::for_test(test, config);

    let (metrics, failures) = evaluate_test(test, &label, plan, config, agent).await;

    let outcome = TestOutcome {
        passed: failures.is_empty(),
        label,
        skill: test.skill.clone(),
        duration: started.elapsed(),
        metrics,
    };
    info!(
        label = %outcome.label,
        passed = outcome.passed,
        failures = failures.len(),
        duration_ms = u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
        "test finished"
    );
    (outcome, failures)
}

async fn evaluate_test<A: AgentRunner>(
    test: &TestCase,
    label: &str,
    plan: TestPlan,
    config: &SuiteConfig,
    agent: &A,
) -> (Option<RunMetrics>, Vec<Failure>) {
    let mut failures = Vec::new();

    let mut output = String::new();
    if plan.needs_text {
        match agent.run(&request(test, config, OutputFormat::Default)).await {
            Ok(text) => output = text,
            Err(e) => {
                failures.push(run_failure(label, &e));
                return (None, failures);
            }
        }
    }

    let mut metrics = None;
    if plan.needs_events {
        match agent.run(&request(test, config, OutputFormat::Events)).await {
            Ok(raw) => metrics = Some(aggregate_events(&raw)),
            Err(e) if !plan.needs_text => {
                failures.push(run_failure(label, &e));
                return (None, failures);
            }
            Err(e) if test.expect.has_tools() => failures.push(Failure::new(
                label,
                FailureKind::EventCapture,
                format!("tool event capture failed: {e}"),
            )),
            Err(e) => warn!(label, error = %e, "usage capture failed"),
        }
    }

    let tools = metrics.as_ref().map_or(&[][..], |m| m.tools.as_slice());
    failures.extend(evaluate_expectations(label, &test.expect, &output, tools));

    if plan.judge {
        if let Some(failure) = judge_test(test, label, &output, config, agent).await {
            failures.push(failure);
        }
    }

    (metrics, failures)
}

async fn judge_test<A: AgentRunner>(
    test: &TestCase,
    label: &str,
    output: &str,
    config: &SuiteConfig,
    agent: &A,
) -> Option<Failure> {
    let skill_text = match load_skill_text(&config.skills_dir, &test.skill) {
        Ok(text) => text,
        Err(JudgeError::MissingSkillFile(path)) => {
            return Some(Failure::new(
                label,
                FailureKind::MissingSkillFile,
                format!("missing skill file: {}", path.display()),
            ));
        }
        Err(e) => return Some(judge_error(label, &e)),
    };

    let settings = JudgeSettings {
        model: config.judge_model().to_string(),
        agent: config.agent.clone(),
        config_dir: config.config_dir.clone(),
        timeout: config.timeout,
    };
    let input = JudgeInput {
        skill_name: &test.skill,
        skill_text: &skill_text,
        task_prompt: &test.prompt,
        output,
    };

    match run_judge(agent, &settings, &input).await {
        Ok(verdict) if verdict.pass => None,
        Ok(verdict) => Some(Failure::new(
            label,
            FailureKind::JudgeVerdict,
            describe_rejection(&verdict),
        )),
        Err(e) => Some(judge_error(label, &e)),
    }
}

fn judge_error(label: &str, error: &JudgeError) -> Failure {
    Failure::new(label, FailureKind::JudgeError, format!("judge failed: {error}"))
}

/// Run every test in order and collect the suite report.
pub async fn run_suite<A: AgentRunner>(
    tests: &[TestCase],
    config: &SuiteConfig,
    agent: &A,
    progress: Option<&ProgressSender>,
) -> SuiteReport {
    let started = Instant::now();
    let mut report = SuiteReport::default();

    if let Some(tx) = progress {
        let _ = tx.send(ProgressEvent::SuiteStarted {
            total_tests: tests.len(),
        });
    }

    for test in tests {
        if let Some(tx) = progress {
            let _ = tx.send(ProgressEvent::TestStarted {
                label: test.label(),
                skill: test.skill.clone(),
            });
        }

        let (outcome, failures) = run_test(test, config, agent).await;
        report.failures.extend(failures.iter().cloned());
        if let Some(ref metrics) = outcome.metrics {
            report.usage.add(metrics);
        }

        if let Some(tx) = progress {
            let _ = tx.send(ProgressEvent::TestCompleted {
                outcome: outcome.clone(),
                failures,
            });
        }
        report.outcomes.push(outcome);
    }

    report.duration = started.elapsed();
    report
}
