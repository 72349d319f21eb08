//! Execution context and template substitution

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

/// Variable bindings and per-node results accumulated over a workflow run
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    variables: HashMap<String, Value>,
    node_results: HashMap<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the context from the run input. An object contributes one
    /// binding per key; any other value is bound under `input`.
    pub fn from_input(input: Value) -> Self {
        let mut context = Self::new();
        match input {
            Value::Object(map) => {
                for (key, value) in map {
                    context.set(key, value);
                }
            }
            Value::Null => {}
            other => context.set("input", other),
        }
        context
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.variables.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn into_variables(self) -> HashMap<String, Value> {
        self.variables
    }

    pub fn record_node_result(&mut self, node_id: impl Into<String>, result: Value) {
        self.node_results.insert(node_id.into(), result);
    }

    pub fn node_result(&self, node_id: &str) -> Option<&Value> {
        self.node_results.get(node_id)
    }

    /// Replace `{{variable}}` placeholders with the bound value. A
    /// placeholder with no binding is left verbatim.
    pub fn substitute(&self, template: &str) -> String {
        PLACEHOLDER_PATTERN
            .replace_all(template, |caps: &regex::Captures<'_>| {
                match self.variables.get(&caps[1]) {
                    Some(value) => value_to_string(value),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Evaluate a boolean condition after substitution.
    ///
    /// `==` compares both sides as trimmed strings; `>` and `<` compare
    /// both sides as numbers. Anything malformed evaluates to false.
    pub fn evaluate_condition(&self, condition: &str) -> bool {
        let resolved = self.substitute(condition);

        if let Some((left, right)) = resolved.split_once("==") {
            return strip_quotes(left.trim()) == strip_quotes(right.trim());
        }

        if let Some((left, right)) = resolved.split_once('>') {
            return match numeric_operands(left, right) {
                Some((l, r)) => l > r,
                None => {
                    warn!("Malformed numeric condition: '{}'", resolved);
                    false
                }
            };
        }

        if let Some((left, right)) = resolved.split_once('<') {
            return match numeric_operands(left, right) {
                Some((l, r)) => l < r,
                None => {
                    warn!("Malformed numeric condition: '{}'", resolved);
                    false
                }
            };
        }

        warn!("Condition has no recognized operator: '{}'", resolved);
        false
    }
}

fn numeric_operands(left: &str, right: &str) -> Option<(f64, f64)> {
    let l = left.trim().parse::<f64>().ok()?;
    let r = right.trim().parse::<f64>().ok()?;
    Some((l, r))
}

fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

/// Render a bound value for prompt interpolation. Strings are used as-is;
/// everything else is compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
