//! Workflow executor trait and run outcomes

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

use super::definition::WorkflowDefinition;
use super::error::WorkflowError;
use super::trace::ExecutionTrace;

/// The caller a run executes on behalf of. Retrieval nodes are scoped to
/// this owner's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub owner_id: String,
}

impl CallerIdentity {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }
}

/// Successful run: the end node's output plus the full trace
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRunResult {
    pub output: Value,
    pub trace: ExecutionTrace,
}

/// Failed run: the error plus the partial trace up to the failure
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{error}")]
pub struct WorkflowRunFailure {
    pub error: WorkflowError,
    pub trace: ExecutionTrace,
}

impl WorkflowRunFailure {
    pub fn new(error: WorkflowError, trace: ExecutionTrace) -> Self {
        Self { error, trace }
    }
}

/// Runs a workflow definition to completion
#[async_trait]
pub trait WorkflowExecutor: Send + Sync + Debug {
    async fn execute(
        &self,
        definition: &WorkflowDefinition,
        input: Value,
        caller: &CallerIdentity,
    ) -> Result<WorkflowRunResult, WorkflowRunFailure>;
}
