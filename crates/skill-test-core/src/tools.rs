//! Tool-name extraction from a single decoded event.
//!
//! The agent's event schema is not fixed across versions, so extraction is a set of
//! independent shape rules applied to the event and to every pair found by
//! [`crate::scanner::walk`]. Free-form string values are only accepted when they look
//! like a tool identifier.

use crate::scanner::walk;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Keys whose string value names a tool.
const TOOL_NAME_KEYS: &[&str] = &["toolName", "tool_name", "tool"];

static TOOL_IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,127}$").ok());

fn is_tool_identifier(value: &str) -> bool {
    TOOL_IDENTIFIER
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

fn name_field(value: &Value) -> Option<&str> {
    value.get("name").and_then(Value::as_str)
}

/// Extract the distinct tool names referenced by one event, in first-seen order.
#[must_use]
pub fn extract_tool_names(event: &Value) -> Vec<String> {
    let mut names: Vec<&str> = Vec::new();

    if event.is_object() {
        let is_tool_event = event
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.to_lowercase().contains("tool"));
        if is_tool_event {
            names.extend(name_field(event));
        }

        match event.get("tool") {
            Some(tool @ Value::Object(_)) => names.extend(name_field(tool)),
            Some(Value::String(tool)) => names.push(tool),
            _ => {}
        }

        if let Some(function @ Value::Object(_)) = event.get("function") {
            names.extend(name_field(function));
        }
    }

    for (key, value) in walk(event) {
        if TOOL_NAME_KEYS.contains(&key) {
            if let Some(name) = value.as_str().filter(|v| is_tool_identifier(v)) {
                names.push(name);
            }
        }
        if key == "function" && value.is_object() {
            names.extend(name_field(value));
        }
    }

    dedup_ordered(names)
}

/// Remove duplicates while keeping the first occurrence of each name.
pub(crate) fn dedup_ordered<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref();
        if !ordered.iter().any(|seen| seen == name) {
            ordered.push(name.to_string());
        }
    }
    ordered
}
