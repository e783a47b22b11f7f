//! Agent CLI invocation.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors that can occur while invoking the agent.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("agent command is empty")]
    EmptyCommand,
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("timeout after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
    #[error("agent failed (exit {code})\n{output}")]
    ExitStatus { code: String, output: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format requested from the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Free text.
    Default,
    /// Newline-delimited JSON events.
    Events,
}

impl OutputFormat {
    /// Value passed to the agent's `--format` flag.
    #[must_use]
    pub const fn as_arg(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Events => "json",
        }
    }
}

/// One agent invocation.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub model: String,
    pub agent: String,
    pub prompt: String,
    pub format: OutputFormat,
    /// Agent configuration directory, exported as `OPENCODE_CONFIG_DIR`.
    pub config_dir: PathBuf,
    pub timeout: Duration,
}

/// Something that can run the agent and return its combined output.
pub trait AgentRunner {
    /// Run the agent once.
    ///
    /// # Errors
    /// Returns an error on spawn failure, timeout, or non-zero exit.
    fn run(&self, request: &AgentRequest) -> impl Future<Output = Result<String, AgentError>> + Send;
}

/// Runs the agent as a subprocess: `<command...> run --format <f> --model <m> --agent <a> <prompt>`.
#[derive(Debug, Clone)]
pub struct CliAgent {
    command: Vec<String>,
}

impl CliAgent {
    /// Create a runner from a command line (program followed by leading arguments).
    ///
    /// # Errors
    /// Returns `AgentError::EmptyCommand` if `command` is empty.
    pub fn new(command: Vec<String>) -> Result<Self, AgentError> {
        if command.is_empty() {
            return Err(AgentError::EmptyCommand);
        }
        Ok(Self { command })
    }

    fn build_command(&self, request: &AgentRequest) -> Result<Command, AgentError> {
        let (program, leading) = self.command.split_first().ok_or(AgentError::EmptyCommand)?;
        let mut cmd = Command::new(program);
        cmd.args(leading)
            .arg("run")
            .arg("--format")
            .arg(request.format.as_arg())
            .arg("--model")
            .arg(&request.model)
            .arg("--agent")
            .arg(&request.agent)
            .arg(&request.prompt)
            .env("OPENCODE_CONFIG_DIR", &request.config_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(cmd)
    }
}

impl AgentRunner for CliAgent {
    async fn run(&self, request: &AgentRequest) -> Result<String, AgentError> {
        info!(
            model = %request.model,
            agent = %request.agent,
            format = request.format.as_arg(),
            "invoking agent"
        );

        let mut cmd = self.build_command(request)?;
        let child = cmd.spawn().map_err(|e| AgentError::Spawn {
            program: cmd.as_std().get_program().to_string_lossy().into_owned(),
            source: e,
        })?;

        let output = match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            // Dropping the future kills the child.
            Err(_) => {
                return Err(AgentError::Timeout {
                    timeout_secs: request.timeout.as_secs(),
                });
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!(bytes = combined.len(), status = ?output.status.code(), "agent finished");

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(AgentError::ExitStatus {
                code,
                output: truncate_string(&combined, 2000),
            });
        }

        Ok(combined)
    }
}

/// Truncate string to max length, adding a marker if truncated.
/// Uses char boundaries to avoid panic on multi-byte UTF-8.
pub(crate) fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let truncated = match s.char_indices().take_while(|(i, _)| *i < max_len).last() {
            Some((i, c)) => &s[..i + c.len_utf8()],
            None => "",
        };
        format!("{truncated}...[truncated]")
    }
}
