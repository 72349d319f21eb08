//! Action node handlers

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::error::DomainError;
use crate::domain::workflow::{ActionNode, ExecutionContext};

/// Executes one kind of action node
#[async_trait]
pub trait ActionHandler: Send + Sync + Debug {
    async fn execute(
        &self,
        node: &ActionNode,
        context: &ExecutionContext,
    ) -> Result<Value, DomainError>;
}

/// Fallback handler that records the request without performing it
#[derive(Debug, Default)]
pub struct RecordOnlyAction;

#[async_trait]
impl ActionHandler for RecordOnlyAction {
    async fn execute(
        &self,
        node: &ActionNode,
        context: &ExecutionContext,
    ) -> Result<Value, DomainError> {
        let description = node.description.as_ref().map(|d| context.substitute(d));

        Ok(json!({
            "kind": node.kind,
            "description": description,
            "performed": false,
        }))
    }
}

/// Handlers keyed by action kind. Unregistered kinds fall back to
/// [`RecordOnlyAction`].
#[derive(Debug)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
    fallback: Arc<dyn ActionHandler>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(RecordOnlyAction),
        }
    }

    pub fn register(&mut self, kind: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(kind.into(), handler);
    }

    pub fn handler_for(&self, kind: &str) -> Arc<dyn ActionHandler> {
        self.handlers
            .get(kind)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
