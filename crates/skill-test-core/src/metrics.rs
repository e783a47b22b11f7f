//! Cost and token usage extraction from a single decoded event.

use crate::scanner::walk;
use crate::types::RunMetrics;
use serde_json::{Number, Value};

const COST_KEYS: &[&str] = &[
    "cost",
    "total_cost",
    "totalcost",
    "cost_usd",
    "costusd",
    "total_cost_usd",
    "totalcostusd",
];

const INPUT_TOKEN_KEYS: &[&str] = &[
    "input",
    "input_tokens",
    "inputtokens",
    "prompt_tokens",
    "prompttokens",
    "tokens_in",
];

const OUTPUT_TOKEN_KEYS: &[&str] = &[
    "output",
    "output_tokens",
    "outputtokens",
    "completion_tokens",
    "completiontokens",
    "tokens_out",
];

/// Usage fields recovered from one event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventUsage {
    pub cost: Option<f64>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

impl EventUsage {
    /// Attach usage to a tool list to form per-event metrics.
    #[must_use]
    pub fn into_metrics(self, tools: Vec<String>) -> RunMetrics {
        RunMetrics {
            tools,
            cost: self.cost,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }
}

/// Extract cost and token counts from one event.
///
/// Only numeric values count. When a category appears several times (some schemas
/// repeat a running total at each step) the largest value wins. Token counts must
/// be non-negative whole numbers; `1200.0` counts as 1200.
#[must_use]
pub fn extract_usage(event: &Value) -> EventUsage {
    let mut usage = EventUsage::default();

    for (key, value) in walk(event) {
        let Value::Number(number) = value else {
            continue;
        };
        let key = key.to_ascii_lowercase();
        let key = key.as_str();

        if COST_KEYS.contains(&key) {
            if let Some(cost) = number.as_f64() {
                usage.cost = Some(usage.cost.map_or(cost, |c| c.max(cost)));
            }
        } else if INPUT_TOKEN_KEYS.contains(&key) {
            if let Some(tokens) = token_count(number) {
                usage.input_tokens = Some(usage.input_tokens.map_or(tokens, |t| t.max(tokens)));
            }
        } else if OUTPUT_TOKEN_KEYS.contains(&key) {
            if let Some(tokens) = token_count(number) {
                usage.output_tokens = Some(usage.output_tokens.map_or(tokens, |t| t.max(tokens)));
            }
        }
    }

    usage
}

/// 2^64, the first float past the `u64` range.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Read a token count, accepting integral floats.
#[allow(
    clippy::float_cmp,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn token_count(number: &Number) -> Option<u64> {
    if let Some(count) = number.as_u64() {
        return Some(count);
    }
    let value = number.as_f64()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < U64_LIMIT {
        Some(value as u64)
    } else {
        None
    }
}
