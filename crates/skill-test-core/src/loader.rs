//! Test definition discovery and loading.

use crate::assertion::compile_pattern;
use crate::types::{Expectations, TestCase};
use glob::glob;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid test file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: missing required field: {field}", path.display())]
    MissingField { path: PathBuf, field: &'static str },
    #[error("{}: invalid pattern '{pattern}': {source}", path.display())]
    InvalidPattern {
        path: PathBuf,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// On-disk shape of a test definition.
#[derive(Debug, Deserialize)]
struct RawTestFile {
    #[serde(default)]
    skill: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    expect: Option<RawExpect>,
    #[serde(default)]
    judge: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExpect {
    #[serde(default)]
    must_match: Vec<String>,
    #[serde(default)]
    must_not_match: Vec<String>,
    #[serde(default)]
    must_tool: Vec<String>,
    #[serde(default)]
    must_not_tool: Vec<String>,
}

/// Discover test definition files: `<skills_dir>/*/tests/*.json`, sorted.
///
/// # Errors
/// Returns an error if the glob pattern is invalid.
pub fn discover_test_files(skills_dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let pattern = skills_dir.join("*").join("tests").join("*.json");
    let mut files: Vec<PathBuf> = glob(&pattern.to_string_lossy())?
        .flatten()
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Parse a test definition from JSON text.
///
/// # Errors
/// Returns an error if:
/// - The JSON is malformed or a field has the wrong shape
/// - `skill` or `prompt` is missing or blank
/// - A `must_match`/`must_not_match` pattern is not a valid regex
pub fn parse_test_case(path: &Path, content: &str) -> Result<TestCase, LoaderError> {
    let raw: RawTestFile = serde_json::from_str(content).map_err(|e| LoaderError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;

    let skill = required(path, raw.skill, "skill")?;
    let prompt = required(path, raw.prompt, "prompt")?;
    let expect = raw.expect.unwrap_or_default();

    for pattern in expect.must_match.iter().chain(&expect.must_not_match) {
        compile_pattern(pattern).map_err(|e| LoaderError::InvalidPattern {
            path: path.to_path_buf(),
            pattern: pattern.clone(),
            source: e,
        })?;
    }

    let use_judge = raw
        .judge
        .as_ref()
        .and_then(|j| j.get("enabled"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(TestCase {
        path: path.to_path_buf(),
        skill,
        prompt,
        expect: Expectations {
            must_match: expect.must_match,
            must_not_match: expect.must_not_match,
            must_tool: expect.must_tool,
            must_not_tool: expect.must_not_tool,
        },
        use_judge,
    })
}

fn required(path: &Path, value: Option<String>, field: &'static str) -> Result<String, LoaderError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LoaderError::MissingField {
            path: path.to_path_buf(),
            field,
        })
}

/// Load a single test definition file.
///
/// # Errors
/// See [`parse_test_case`]; also fails if the file cannot be read.
pub fn load_test_case(path: &Path) -> Result<TestCase, LoaderError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_test_case(path, &content)
}

/// Load every test under `skills_dir`, then keep those matching `skill_filter`.
///
/// All files are validated before filtering, so a malformed file fails the run even
/// when it belongs to another skill.
///
/// # Errors
/// Returns the first loading error encountered.
pub fn load_suite(skills_dir: &Path, skill_filter: Option<&str>) -> Result<Vec<TestCase>, LoaderError> {
    let mut tests = Vec::new();
    for path in discover_test_files(skills_dir)? {
        tests.push(load_test_case(&path)?);
    }
    Ok(filter_by_skill(tests, skill_filter))
}

/// Keep tests whose skill equals `skill_filter`; no filter keeps everything.
#[must_use]
pub fn filter_by_skill(tests: Vec<TestCase>, skill_filter: Option<&str>) -> Vec<TestCase> {
    match skill_filter {
        Some(skill) => tests.into_iter().filter(|t| t.skill == skill).collect(),
        None => tests,
    }
}
