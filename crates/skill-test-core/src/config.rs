//! Configuration loader for skill-test.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the optional configuration file at the repository root.
pub const CONFIG_FILE_NAME: &str = "skill-test.config.yaml";

const DEFAULT_AGENT: &str = "build";
const DEFAULT_TIMEOUT_SECS: u64 = 600;
const DEFAULT_SKILLS_DIR: &str = "opencode/config/skills";
const DEFAULT_CONFIG_DIR: &str = "opencode/config";
const DEFAULT_AGENT_COMMAND: &str = "opencode";

/// Errors that can occur during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("agent-command must not be empty")]
    EmptyAgentCommand,
}

/// Settings read from `skill-test.config.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub agent: Option<String>,
    pub eval_model: Option<String>,
    pub timeout_s: Option<u64>,
    pub skills_dir: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub agent_command: Option<Vec<String>>,
}

/// Fully resolved settings for one suite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    /// Model used for test runs.
    pub model: String,
    /// Model used by the judge; falls back to `model`.
    pub eval_model: Option<String>,
    pub agent: String,
    /// Only run tests for this skill.
    pub skill_filter: Option<String>,
    pub enable_judge: bool,
    /// Capture the event stream of every test to report cost and tokens.
    pub report_usage: bool,
    pub timeout: Duration,
    /// Directory holding `<skill>/SKILL.md` and `<skill>/tests/*.json`.
    pub skills_dir: PathBuf,
    /// Directory handed to the agent as its configuration directory.
    pub config_dir: PathBuf,
    /// Agent program followed by leading arguments.
    pub agent_command: Vec<String>,
}

impl SuiteConfig {
    /// Defaults for a repository rooted at `root`.
    #[must_use]
    pub fn with_root(root: &Path, model: &str) -> Self {
        Self {
            model: model.to_string(),
            eval_model: None,
            agent: DEFAULT_AGENT.to_string(),
            skill_filter: None,
            enable_judge: false,
            report_usage: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            skills_dir: root.join(DEFAULT_SKILLS_DIR),
            config_dir: root.join(DEFAULT_CONFIG_DIR),
            agent_command: vec![DEFAULT_AGENT_COMMAND.to_string()],
        }
    }

    /// Model used by the judge.
    #[must_use]
    pub fn judge_model(&self) -> &str {
        self.eval_model.as_deref().unwrap_or(&self.model)
    }
}

/// CLI override options for configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub eval_model: Option<String>,
    pub agent: Option<String>,
    pub skill_filter: Option<String>,
    pub enable_judge: bool,
    pub report_usage: bool,
    pub timeout_s: Option<u64>,
}

/// Read `skill-test.config.yaml` from `root`, or defaults if it doesn't exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_file_config(root: &Path) -> Result<FileConfig, ConfigError> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yml::from_str(&content)?)
}

/// Layer file settings and CLI overrides on top of the defaults.
///
/// Relative directories in the file are resolved against `root`.
///
/// # Errors
/// Returns an error if the resulting timeout is zero or the agent command is empty.
pub fn resolve_config(
    root: &Path,
    model: &str,
    file: FileConfig,
    overrides: &ConfigOverrides,
) -> Result<SuiteConfig, ConfigError> {
    let mut config = SuiteConfig::with_root(root, model);

    if let Some(agent) = file.agent {
        config.agent = agent;
    }
    if let Some(eval_model) = file.eval_model {
        config.eval_model = Some(eval_model);
    }
    if let Some(secs) = file.timeout_s {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(dir) = file.skills_dir {
        config.skills_dir = root.join(dir);
    }
    if let Some(dir) = file.config_dir {
        config.config_dir = root.join(dir);
    }
    if let Some(command) = file.agent_command {
        config.agent_command = command;
    }

    if let Some(ref eval_model) = overrides.eval_model {
        config.eval_model = Some(eval_model.clone());
    }
    if let Some(ref agent) = overrides.agent {
        config.agent.clone_from(agent);
    }
    if let Some(secs) = overrides.timeout_s {
        config.timeout = Duration::from_secs(secs);
    }
    config.skill_filter.clone_from(&overrides.skill_filter);
    config.enable_judge = overrides.enable_judge;
    config.report_usage = overrides.report_usage;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &SuiteConfig) -> Result<(), ConfigError> {
    if config.timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout);
    }
    if config.agent_command.is_empty() {
        return Err(ConfigError::EmptyAgentCommand);
    }
    Ok(())
}

/// Load the configuration file from `root` and resolve the final settings.
///
/// # Errors
/// See [`load_file_config`] and [`resolve_config`].
pub fn load_config(
    root: &Path,
    model: &str,
    overrides: &ConfigOverrides,
) -> Result<SuiteConfig, ConfigError> {
    let file = load_file_config(root)?;
    resolve_config(root, model, file, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_defaults_when_file_missing() -> TestResult {
        let dir = TempDir::new()?;
        let config = load_config(dir.path(), "p/m", &ConfigOverrides::default())?;
        assert_eq!(config.model, "p/m");
        assert_eq!(config.judge_model(), "p/m");
        assert_eq!(config.agent, "build");
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert_eq!(config.skills_dir, dir.path().join("opencode/config/skills"));
        assert_eq!(config.config_dir, dir.path().join("opencode/config"));
        assert_eq!(config.agent_command, vec!["opencode"]);
        assert!(!config.enable_judge);
        Ok(())
    }

    #[test]
    fn test_load_from_file() -> TestResult {
        let dir = TempDir::new()?;
        let content = r"
agent: plan
eval-model: judge/model
timeout-s: 30
skills-dir: skills
config-dir: agent-config
agent-command: [sh, -c, 'echo hi', agent]
";
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), content)?;

        let config = load_config(dir.path(), "p/m", &ConfigOverrides::default())?;
        assert_eq!(config.agent, "plan");
        assert_eq!(config.judge_model(), "judge/model");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.skills_dir, dir.path().join("skills"));
        assert_eq!(config.config_dir, dir.path().join("agent-config"));
        assert_eq!(config.agent_command, vec!["sh", "-c", "echo hi", "agent"]);
        Ok(())
    }

    #[test]
    fn test_unknown_key_rejected() -> TestResult {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "iterations: 3\n")?;
        let result = load_config(dir.path(), "p/m", &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
        Ok(())
    }

    #[test]
    fn test_overrides_win() -> TestResult {
        let dir = TempDir::new()?;
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "agent: plan\ntimeout-s: 30\neval-model: file/judge\n",
        )?;
        let overrides = ConfigOverrides {
            eval_model: Some("cli/judge".to_string()),
            agent: Some("review".to_string()),
            skill_filter: Some("echo".to_string()),
            enable_judge: true,
            report_usage: true,
            timeout_s: Some(5),
        };

        let config = load_config(dir.path(), "p/m", &overrides)?;
        assert_eq!(config.agent, "review");
        assert_eq!(config.judge_model(), "cli/judge");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.skill_filter.as_deref(), Some("echo"));
        assert!(config.enable_judge);
        assert!(config.report_usage);
        Ok(())
    }

    #[test]
    fn test_zero_timeout_rejected() -> TestResult {
        let dir = TempDir::new()?;
        let overrides = ConfigOverrides {
            timeout_s: Some(0),
            ..Default::default()
        };
        let result = load_config(dir.path(), "p/m", &overrides);
        assert!(matches!(result, Err(ConfigError::ZeroTimeout)));
        Ok(())
    }

    #[test]
    fn test_empty_agent_command_rejected() -> TestResult {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "agent-command: []\n")?;
        let result = load_config(dir.path(), "p/m", &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::EmptyAgentCommand)));
        Ok(())
    }

    #[test]
    fn test_empty_file_uses_defaults() -> TestResult {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "\n")?;
        let config = load_config(dir.path(), "p/m", &ConfigOverrides::default())?;
        assert_eq!(config.agent, "build");
        Ok(())
    }
}
