//! LLM-as-judge grading of a run's output against the skill it should follow.

use crate::agent::{AgentError, AgentRequest, AgentRunner, OutputFormat, truncate_string};
use crate::types::JudgeVerdict;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that keep the judge from producing a verdict.
///
/// A parsed verdict with `pass != true` is not an error; see [`JudgeVerdict`].
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("missing skill file: {}", .0.display())]
    MissingSkillFile(PathBuf),
    #[error("failed to read skill file {}: {source}", path.display())]
    SkillFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("judge did not return valid JSON: {source}\n{raw}")]
    InvalidReply {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
}

/// Shape the judge is asked to reply with.
pub const VERDICT_SHAPE: &str = r#"{"pass": true|false, "violations": ["..."], "notes": "..."}"#;

/// Everything the judge needs to grade one output.
#[derive(Debug, Clone)]
pub struct JudgeInput<'a> {
    pub skill_name: &'a str,
    pub skill_text: &'a str,
    pub task_prompt: &'a str,
    pub output: &'a str,
}

/// Settings for judge invocations.
#[derive(Debug, Clone)]
pub struct JudgeSettings {
    pub model: String,
    pub agent: String,
    pub config_dir: PathBuf,
    pub timeout: Duration,
}

/// Path of a skill's defining text.
#[must_use]
pub fn skill_file_path(skills_dir: &Path, skill: &str) -> PathBuf {
    skills_dir.join(skill).join("SKILL.md")
}

/// Read a skill's defining text.
///
/// # Errors
/// Returns `JudgeError::MissingSkillFile` if the file does not exist.
pub fn load_skill_text(skills_dir: &Path, skill: &str) -> Result<String, JudgeError> {
    let path = skill_file_path(skills_dir, skill);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(JudgeError::MissingSkillFile(path))
        }
        Err(e) => Err(JudgeError::SkillFile { path, source: e }),
    }
}

/// Build the grading prompt.
#[must_use]
pub fn build_judge_prompt(input: &JudgeInput<'_>) -> String {
    let name_line = format!("Skill name: {}", input.skill_name);
    [
        "You are grading whether an assistant followed a skill.",
        "Return strict JSON only.",
        "",
        name_line.as_str(),
        "Skill text:",
        input.skill_text,
        "",
        "Task prompt:",
        input.task_prompt,
        "",
        "Assistant output:",
        input.output,
        "",
        "Return JSON with this shape:",
        VERDICT_SHAPE,
    ]
    .join("\n")
}

/// Parse the judge's reply.
///
/// The trimmed reply must be exactly one JSON document. Any document that parses is a
/// verdict: `pass` is true only for a literal `true`; `violations` keeps its string
/// entries; `notes` is kept when it is a string.
///
/// # Errors
/// Returns `JudgeError::InvalidReply` if the reply is not a single JSON document.
pub fn parse_verdict(reply: &str) -> Result<JudgeVerdict, JudgeError> {
    let raw = reply.trim();
    let value: Value = serde_json::from_str(raw).map_err(|e| JudgeError::InvalidReply {
        source: e,
        raw: truncate_string(raw, 1000),
    })?;

    let pass = value.get("pass").and_then(Value::as_bool) == Some(true);
    let violations = value
        .get("violations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();
    let notes = value
        .get("notes")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(JudgeVerdict {
        pass,
        violations,
        notes,
    })
}

/// Ask the judge to grade an output.
///
/// # Errors
/// Returns an error if the agent invocation fails or the reply does not parse.
pub async fn run_judge<A: AgentRunner>(
    agent: &A,
    settings: &JudgeSettings,
    input: &JudgeInput<'_>,
) -> Result<JudgeVerdict, JudgeError> {
    let request = AgentRequest {
        model: settings.model.clone(),
        agent: settings.agent.clone(),
        prompt: build_judge_prompt(input),
        format: OutputFormat::Default,
        config_dir: settings.config_dir.clone(),
        timeout: settings.timeout,
    };
    let reply = agent.run(&request).await?;
    parse_verdict(&reply)
}

/// Describe a failing verdict.
#[must_use]
pub fn describe_rejection(verdict: &JudgeVerdict) -> String {
    let mut message = format!("judge rejected output: {:?}", verdict.violations);
    if !verdict.notes.is_empty() {
        message.push_str(&format!(" (notes: {})", verdict.notes));
    }
    message
}
