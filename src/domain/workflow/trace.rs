//! Per-node execution trace

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record of one executed node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTraceEntry {
    pub node_id: String,
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
}

impl NodeTraceEntry {
    pub fn success(
        node_id: impl Into<String>,
        node_type: impl Into<String>,
        result: Value,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: node_type.into(),
            result: Some(result),
            error: None,
            elapsed_ms,
            input_tokens: None,
            output_tokens: None,
        }
    }

    pub fn failure(
        node_id: impl Into<String>,
        node_type: impl Into<String>,
        error: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: node_type.into(),
            result: None,
            error: Some(error.into()),
            elapsed_ms,
            input_tokens: None,
            output_tokens: None,
        }
    }

    pub fn with_tokens(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }
}

/// Append-only sequence of node trace entries for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    entries: Vec<NodeTraceEntry>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: NodeTraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[NodeTraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total tokens consumed by model calls in this run.
    pub fn total_tokens(&self) -> (u32, u32) {
        self.entries.iter().fold((0, 0), |(input, output), entry| {
            (
                input + entry.input_tokens.unwrap_or(0),
                output + entry.output_tokens.unwrap_or(0),
            )
        })
    }
}
