//! Graph-walking workflow executor
//!
//! Walks the definition node by node from the start, binding each node's
//! output into the execution context and appending a trace entry per node.
//! A revisited node means the graph looped at runtime, which aborts the
//! run; the first failure of any node aborts with the partial trace.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::actions::ActionRegistry;
use crate::domain::documents::Retriever;
use crate::domain::error::DomainError;
use crate::domain::llm::{Message, ModelConfig, ModelInvoker};
use crate::domain::workflow::{
    CallerIdentity, EndNode, ExecutionContext, ExecutionTrace, ModelCallNode, NodeId, NodeKind,
    NodeTraceEntry, RetrievalNode, WorkflowDefinition, WorkflowError, WorkflowExecutor,
    WorkflowNode, WorkflowRunFailure, WorkflowRunResult,
};

const DEFAULT_RETRIEVAL_LIMIT: usize = 5;

#[derive(Debug)]
pub struct GraphExecutor {
    invoker: Arc<dyn ModelInvoker>,
    retriever: Arc<dyn Retriever>,
    actions: ActionRegistry,
}

impl GraphExecutor {
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        retriever: Arc<dyn Retriever>,
        actions: ActionRegistry,
    ) -> Self {
        Self {
            invoker,
            retriever,
            actions,
        }
    }

    async fn run_model_call(
        &self,
        node: &ModelCallNode,
        context: &mut ExecutionContext,
    ) -> Result<(Value, u32, u32), DomainError> {
        let mut messages = Vec::new();
        if let Some(system_prompt) = &node.system_prompt {
            messages.push(Message::system(context.substitute(system_prompt)));
        }
        messages.push(Message::user(context.substitute(&node.prompt)));

        let mut config = ModelConfig::new(&node.model);
        config.temperature = node.temperature;
        config.max_tokens = node.max_tokens;

        let result = self.invoker.invoke(&config, &messages).await?;

        context.set(&node.output_variable, json!(result.content));

        Ok((
            json!({
                "model": result.resolved_model_id,
                "content": result.content,
            }),
            result.input_tokens,
            result.output_tokens,
        ))
    }

    async fn run_retrieval(
        &self,
        node: &RetrievalNode,
        context: &mut ExecutionContext,
        caller: &CallerIdentity,
    ) -> Result<Value, DomainError> {
        let query = context.substitute(&node.query);
        let limit = node.limit.unwrap_or(DEFAULT_RETRIEVAL_LIMIT);
        let threshold = node.threshold.unwrap_or(0.0);

        let chunks = self
            .retriever
            .retrieve(&caller.owner_id, &query, limit, threshold)
            .await?;

        let value = serde_json::to_value(&chunks)
            .map_err(|e| DomainError::validation(format!("Unserializable chunks: {}", e)))?;
        context.set(&node.output_variable, value.clone());

        Ok(json!({"query": query, "chunks": value}))
    }

    fn end_output(&self, node: &EndNode, context: &ExecutionContext) -> Value {
        match &node.output_mapping {
            Some(mapping) => {
                let mut output = Map::new();
                for (key, variable) in mapping {
                    let value = context.get(variable).cloned().unwrap_or(Value::Null);
                    output.insert(key.clone(), value);
                }
                Value::Object(output)
            }
            None => {
                let mut output = Map::new();
                for (key, value) in context.variables() {
                    output.insert(key.clone(), value.clone());
                }
                Value::Object(output)
            }
        }
    }

    /// Execute one node, returning its trace payload and optional token
    /// counts.
    async fn run_node(
        &self,
        node: &WorkflowNode,
        context: &mut ExecutionContext,
        caller: &CallerIdentity,
    ) -> Result<(Value, Option<(u32, u32)>), WorkflowError> {
        match &node.kind {
            NodeKind::Start => Ok((Value::Null, None)),
            NodeKind::ModelCall(model_call) => {
                let (payload, input_tokens, output_tokens) = self
                    .run_model_call(model_call, context)
                    .await
                    .map_err(|e| WorkflowError::node_execution(node.id.as_str(), e.to_string()))?;
                Ok((payload, Some((input_tokens, output_tokens))))
            }
            NodeKind::Retrieval(retrieval) => {
                let payload = self
                    .run_retrieval(retrieval, context, caller)
                    .await
                    .map_err(|e| WorkflowError::node_execution(node.id.as_str(), e.to_string()))?;
                Ok((payload, None))
            }
            NodeKind::Action(action) => {
                let payload = self
                    .actions
                    .handler_for(&action.kind)
                    .execute(action, context)
                    .await
                    .map_err(|e| WorkflowError::node_execution(node.id.as_str(), e.to_string()))?;
                Ok((payload, None))
            }
            NodeKind::Conditional(conditional) => {
                let outcome = context.evaluate_condition(&conditional.condition);
                Ok((json!({"outcome": outcome}), None))
            }
            NodeKind::End(_) => Ok((Value::Null, None)),
        }
    }

    fn next_node(
        &self,
        definition: &WorkflowDefinition,
        node: &WorkflowNode,
        payload: &Value,
    ) -> Result<Option<NodeId>, WorkflowError> {
        match &node.kind {
            NodeKind::End(_) => Ok(None),
            NodeKind::Conditional(_) => {
                let outcome = payload["outcome"].as_bool().unwrap_or(false);
                let branch = if outcome { "true" } else { "false" };
                definition
                    .next_branch(&node.id, outcome)
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| WorkflowError::missing_branch(node.id.as_str(), branch))
            }
            // A node with no outgoing edge ends the run
            _ => Ok(definition.next_default(&node.id).cloned()),
        }
    }
}

#[async_trait]
impl WorkflowExecutor for GraphExecutor {
    async fn execute(
        &self,
        definition: &WorkflowDefinition,
        input: Value,
        caller: &CallerIdentity,
    ) -> Result<WorkflowRunResult, WorkflowRunFailure> {
        let mut trace = ExecutionTrace::new();

        if let Err(e) = definition.validate() {
            return Err(WorkflowRunFailure::new(e, trace));
        }

        let start = definition
            .start_node()
            .map_err(|e| WorkflowRunFailure::new(e, ExecutionTrace::new()))?;

        let mut context = ExecutionContext::from_input(input);
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut current = start.id.clone();

        info!(
            "Executing workflow '{}' for owner '{}'",
            definition.id, caller.owner_id
        );

        loop {
            let node = match definition.node(&current) {
                Some(node) => node,
                None => {
                    let error = WorkflowError::validation(format!(
                        "Edge leads to unknown node: '{}'",
                        current
                    ));
                    return Err(WorkflowRunFailure::new(error, trace));
                }
            };

            if !visited.insert(current.clone()) {
                // Converging back onto a finished end node is a normal stop
                if matches!(node.kind, NodeKind::End(_)) {
                    break;
                }
                let error = WorkflowError::circular_dependency(current.as_str());
                return Err(WorkflowRunFailure::new(error, trace));
            }

            debug!("Executing node '{}' ({})", node.id, node.kind.name());
            let started = Instant::now();

            let (payload, tokens) = match self.run_node(node, &mut context, caller).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Node '{}' failed: {}", node.id, e);
                    trace.push(NodeTraceEntry::failure(
                        node.id.as_str(),
                        node.kind.name(),
                        e.to_string(),
                        started.elapsed().as_millis() as u64,
                    ));
                    return Err(WorkflowRunFailure::new(e, trace));
                }
            };

            context.record_node_result(node.id.as_str(), payload.clone());

            let mut entry = NodeTraceEntry::success(
                node.id.as_str(),
                node.kind.name(),
                payload.clone(),
                started.elapsed().as_millis() as u64,
            );
            if let Some((input_tokens, output_tokens)) = tokens {
                entry = entry.with_tokens(input_tokens, output_tokens);
            }
            trace.push(entry);

            if let NodeKind::End(end) = &node.kind {
                let output = self.end_output(end, &context);
                return Ok(WorkflowRunResult { output, trace });
            }

            current = match self.next_node(definition, node, &payload) {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(e) => return Err(WorkflowRunFailure::new(e, trace)),
            };
        }

        // Reached when a node has no outgoing edge or the walk converges
        // on an already-finished end node; the run ends with the current
        // bindings as output
        let output = self.end_output(&EndNode { output_mapping: None }, &context);
        Ok(WorkflowRunResult { output, trace })
    }
}
