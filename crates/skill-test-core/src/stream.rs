//! Aggregation of a raw agent event stream into run metrics.

use crate::metrics::extract_usage;
use crate::tools::extract_tool_names;
use crate::types::RunMetrics;
use serde_json::Value;
use tracing::debug;

/// Decode the events contained in raw agent output.
///
/// The input is read as newline-delimited JSON; blank lines and lines that fail to
/// decode are skipped. When the decoded lines name no tool, the whole text is tried
/// as a single document, which covers pretty-printed output whose scalar lines
/// happen to decode on their own.
#[must_use]
pub fn decode_events(raw: &str) -> Vec<Value> {
    let events = decode_lines(raw);
    if events.iter().any(|event| !extract_tool_names(event).is_empty()) {
        return events;
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(document) => {
            debug!(lines = events.len(), "decoded output as a single document");
            vec![document]
        }
        Err(_) => events,
    }
}

fn decode_lines(raw: &str) -> Vec<Value> {
    let mut events = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(event) => events.push(event),
            Err(e) => debug!(line = index + 1, error = %e, "skipping undecodable event line"),
        }
    }
    events
}

/// Metrics for a single decoded event.
#[must_use]
pub fn event_metrics(event: &Value) -> RunMetrics {
    extract_usage(event).into_metrics(extract_tool_names(event))
}

/// Aggregate tool names and usage across a whole event stream.
///
/// Per-event results are folded with [`RunMetrics::merge`], so the output depends
/// only on the input text.
#[must_use]
pub fn aggregate_events(raw: &str) -> RunMetrics {
    let events = decode_events(raw);
    let metrics = events
        .iter()
        .map(event_metrics)
        .fold(RunMetrics::default(), |acc, m| acc.merged(&m));
    debug!(
        events = events.len(),
        tools = ?metrics.tools,
        cost = ?metrics.cost,
        "aggregated event stream"
    );
    metrics
}
