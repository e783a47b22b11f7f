//! Integration tests for skill-test CLI.
//!
//! Each test targets a specific feature to ensure failures clearly identify what broke.
//!
//! ## Test Categories
//!
//! ### CLI Arguments
//! - help, version, missing/invalid args
//! - empty skills tree
//!
//! ### Suite Runs (fake agent, unix only)
//! - output patterns, tool expectations
//! - skill filter, load errors
//! - agent failures, usage reporting
//! - judge verdicts, JSON output

#[path = "cli_tests/args.rs"]
mod args;
#[path = "cli_tests/suite.rs"]
mod suite;

use std::fs;
use std::path::{Path, PathBuf};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

#[must_use]
pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_skill-test"))
}

/// Create a skill-test command rooted at `root` with a fixed model.
#[must_use]
pub fn skill_test(root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(binary_path());
    cmd.env_remove("NO_COLOR")
        .arg("--model")
        .arg("test/model")
        .arg("--root")
        .arg(root);
    cmd
}

/// Write `skills/<skill>/tests/<name>` under `root`.
pub fn write_test_file(root: &Path, skill: &str, name: &str, content: &str) -> std::io::Result<()> {
    let dir = root.join("skills").join(skill).join("tests");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(name), content)
}

/// Install a fake agent script and point the config file at it.
///
/// The script receives `run --format <f> --model <m> --agent <a> <prompt>`.
pub fn install_agent(root: &Path, script: &str) -> std::io::Result<()> {
    let agent = root.join("agent.sh");
    fs::write(&agent, script)?;
    let config = format!(
        "skills-dir: skills\nconfig-dir: agent-config\ntimeout-s: 30\nagent-command:\n  - sh\n  - '{}'\n",
        agent.display()
    );
    fs::write(root.join("skill-test.config.yaml"), config)
}
