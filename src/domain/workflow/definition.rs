//! Workflow graph definition
//!
//! A workflow is a directed graph with exactly one start node and at least
//! one end node. Edges out of a conditional node carry a branch label;
//! every other node has at most one unlabeled edge, and a node with none
//! ends the run. The whole shape is checked up front by
//! [`WorkflowDefinition::validate`] so execution never discovers a
//! malformed graph mid-run.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::WorkflowError;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").unwrap());

/// Identifier of a node within a workflow
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NodeId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if ID_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(WorkflowError::validation(format!(
                "Invalid node id: '{}'",
                value
            )))
        }
    }
}

impl TryFrom<&str> for NodeId {
    type Error = WorkflowError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a workflow definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if ID_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(WorkflowError::validation(format!(
                "Invalid workflow id: '{}'",
                value
            )))
        }
    }
}

impl TryFrom<&str> for WorkflowId {
    type Error = WorkflowError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calls a model with a templated prompt and binds the completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCallNode {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub output_variable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Runs similarity search with a templated query and binds the results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalNode {
    pub query: String,
    pub output_variable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
}

/// Dispatches to a registered action handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Routes execution on a boolean condition over context variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalNode {
    pub condition: String,
}

/// Terminates the run, optionally projecting selected variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_mapping: Option<HashMap<String, String>>,
}

/// Node behavior variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    ModelCall(ModelCallNode),
    Retrieval(RetrievalNode),
    Action(ActionNode),
    Conditional(ConditionalNode),
    End(EndNode),
}

impl NodeKind {
    /// Stable name used in traces and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ModelCall(_) => "model_call",
            Self::Retrieval(_) => "retrieval",
            Self::Action(_) => "action",
            Self::Conditional(_) => "conditional",
            Self::End(_) => "end",
        }
    }
}

/// A node in the workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Label on an edge leaving a conditional node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchLabel {
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
}

impl BranchLabel {
    pub fn from_outcome(outcome: bool) -> Self {
        if outcome {
            Self::True
        } else {
            Self::False
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
        }
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchLabel>,
}

impl WorkflowEdge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: BranchLabel) -> Self {
        self.branch = Some(branch);
        self
    }
}

/// A complete workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub name: String,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowDefinition {
    /// Check the structural invariants of the graph.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(&node.id) {
                return Err(WorkflowError::validation(format!(
                    "Duplicate node id: '{}'",
                    node.id
                )));
            }
        }

        let start_count = self
            .nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Start))
            .count();
        if start_count != 1 {
            return Err(WorkflowError::validation(format!(
                "Workflow must have exactly one start node, found {}",
                start_count
            )));
        }

        if !self.nodes.iter().any(|n| matches!(n.kind, NodeKind::End(_))) {
            return Err(WorkflowError::validation(
                "Workflow must have at least one end node",
            ));
        }

        for edge in &self.edges {
            if !ids.contains(&edge.source) {
                return Err(WorkflowError::validation(format!(
                    "Edge references unknown source node: '{}'",
                    edge.source
                )));
            }
            if !ids.contains(&edge.target) {
                return Err(WorkflowError::validation(format!(
                    "Edge references unknown target node: '{}'",
                    edge.target
                )));
            }
        }

        for node in &self.nodes {
            self.validate_outgoing(node)?;
        }

        self.validate_end_reachable()?;

        Ok(())
    }

    fn validate_outgoing(&self, node: &WorkflowNode) -> Result<(), WorkflowError> {
        let outgoing: Vec<&WorkflowEdge> =
            self.edges.iter().filter(|e| e.source == node.id).collect();

        match &node.kind {
            NodeKind::End(_) => {
                if !outgoing.is_empty() {
                    return Err(WorkflowError::validation(format!(
                        "End node '{}' must not have outgoing edges",
                        node.id
                    )));
                }
            }
            NodeKind::Conditional(_) => {
                let true_edges = outgoing
                    .iter()
                    .filter(|e| e.branch == Some(BranchLabel::True))
                    .count();
                let false_edges = outgoing
                    .iter()
                    .filter(|e| e.branch == Some(BranchLabel::False))
                    .count();

                if true_edges != 1 || false_edges != 1 || outgoing.len() != 2 {
                    return Err(WorkflowError::validation(format!(
                        "Conditional node '{}' must have exactly one 'true' and one 'false' edge",
                        node.id
                    )));
                }
            }
            _ => {
                if outgoing.len() > 1 || outgoing.iter().any(|e| e.branch.is_some()) {
                    return Err(WorkflowError::validation(format!(
                        "Node '{}' must have at most one unlabeled outgoing edge",
                        node.id
                    )));
                }
            }
        }

        Ok(())
    }

    fn validate_end_reachable(&self) -> Result<(), WorkflowError> {
        let start = self
            .nodes
            .iter()
            .find(|n| matches!(n.kind, NodeKind::Start))
            .map(|n| &n.id)
            .ok_or_else(|| WorkflowError::validation("Workflow has no start node"))?;

        let mut adjacency: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        for edge in &self.edges {
            adjacency.entry(&edge.source).or_default().push(&edge.target);
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }

            if let Some(node) = self.node(id) {
                if matches!(node.kind, NodeKind::End(_)) {
                    return Ok(());
                }
            }

            if let Some(targets) = adjacency.get(id) {
                queue.extend(targets.iter().copied());
            }
        }

        Err(WorkflowError::validation(
            "No end node is reachable from the start node",
        ))
    }

    pub fn node(&self, id: &NodeId) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn start_node(&self) -> Result<&WorkflowNode, WorkflowError> {
        self.nodes
            .iter()
            .find(|n| matches!(n.kind, NodeKind::Start))
            .ok_or_else(|| WorkflowError::validation("Workflow has no start node"))
    }

    /// The unlabeled outgoing edge target of a non-conditional node.
    pub fn next_default(&self, from: &NodeId) -> Option<&NodeId> {
        self.edges
            .iter()
            .find(|e| &e.source == from && e.branch.is_none())
            .map(|e| &e.target)
    }

    /// The labeled outgoing edge target matching a conditional outcome.
    pub fn next_branch(&self, from: &NodeId, outcome: bool) -> Option<&NodeId> {
        let label = BranchLabel::from_outcome(outcome);
        self.edges
            .iter()
            .find(|e| &e.source == from && e.branch == Some(label))
            .map(|e| &e.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::try_from(s).unwrap()
    }

    fn node(s: &str, kind: NodeKind) -> WorkflowNode {
        WorkflowNode { id: id(s), kind }
    }

    fn end_node(s: &str) -> WorkflowNode {
        node(s, NodeKind::End(EndNode { output_mapping: None }))
    }

    fn linear_workflow() -> WorkflowDefinition {
        WorkflowDefinition {
            id: WorkflowId::try_from("wf-1").unwrap(),
            name: "linear".to_string(),
            nodes: vec![
                node("start", NodeKind::Start),
                node(
                    "act",
                    NodeKind::Action(ActionNode {
                        kind: "noop".to_string(),
                        description: None,
                    }),
                ),
                end_node("end"),
            ],
            edges: vec![
                WorkflowEdge::new(id("start"), id("act")),
                WorkflowEdge::new(id("act"), id("end")),
            ],
        }
    }

    #[test]
    fn test_node_id_validation() {
        assert!(NodeId::try_from("summarize").is_ok());
        assert!(NodeId::try_from("node_1-a").is_ok());
        assert!(NodeId::try_from("").is_err());
        assert!(NodeId::try_from("has space").is_err());
        assert!(NodeId::try_from("-leading-dash").is_err());
    }

    #[test]
    fn test_valid_linear_workflow() {
        assert!(linear_workflow().validate().is_ok());
    }

    #[test]
    fn test_duplicate_node_ids_rejected() {
        let mut wf = linear_workflow();
        wf.nodes.push(end_node("end"));

        assert!(matches!(
            wf.validate(),
            Err(WorkflowError::Validation { .. })
        ));
    }

    #[test]
    fn test_missing_start_rejected() {
        let mut wf = linear_workflow();
        wf.nodes.retain(|n| !matches!(n.kind, NodeKind::Start));
        wf.edges.retain(|e| e.source != id("start"));

        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_edge_to_unknown_node_rejected() {
        let mut wf = linear_workflow();
        wf.edges.push(WorkflowEdge::new(id("end"), id("ghost")));

        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_conditional_requires_both_branches() {
        let mut wf = WorkflowDefinition {
            id: WorkflowId::try_from("wf-2").unwrap(),
            name: "branchy".to_string(),
            nodes: vec![
                node("start", NodeKind::Start),
                node(
                    "check",
                    NodeKind::Conditional(ConditionalNode {
                        condition: "{{score}} > 3".to_string(),
                    }),
                ),
                end_node("yes"),
                end_node("no"),
            ],
            edges: vec![
                WorkflowEdge::new(id("start"), id("check")),
                WorkflowEdge::new(id("check"), id("yes")).with_branch(BranchLabel::True),
            ],
        };

        assert!(wf.validate().is_err());

        wf.edges
            .push(WorkflowEdge::new(id("check"), id("no")).with_branch(BranchLabel::False));
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_multiple_unlabeled_edges_rejected() {
        let mut wf = linear_workflow();
        wf.edges.push(WorkflowEdge::new(id("act"), id("end")));

        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_dead_end_branch_is_allowed() {
        // The sink node has no outgoing edge; an end node is still
        // reachable through the false branch
        let wf = WorkflowDefinition {
            id: WorkflowId::try_from("wf-4").unwrap(),
            name: "dead-end".to_string(),
            nodes: vec![
                node("start", NodeKind::Start),
                node(
                    "check",
                    NodeKind::Conditional(ConditionalNode {
                        condition: "{{score}} > 3".to_string(),
                    }),
                ),
                node(
                    "sink",
                    NodeKind::Action(ActionNode {
                        kind: "noop".to_string(),
                        description: None,
                    }),
                ),
                end_node("end"),
            ],
            edges: vec![
                WorkflowEdge::new(id("start"), id("check")),
                WorkflowEdge::new(id("check"), id("sink")).with_branch(BranchLabel::True),
                WorkflowEdge::new(id("check"), id("end")).with_branch(BranchLabel::False),
            ],
        };

        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_end_node_with_outgoing_edge_rejected() {
        let mut wf = linear_workflow();
        wf.edges.push(WorkflowEdge::new(id("end"), id("act")));

        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_unreachable_end_rejected() {
        let wf = WorkflowDefinition {
            id: WorkflowId::try_from("wf-3").unwrap(),
            name: "disconnected".to_string(),
            nodes: vec![
                node("start", NodeKind::Start),
                node(
                    "a",
                    NodeKind::Action(ActionNode {
                        kind: "noop".to_string(),
                        description: None,
                    }),
                ),
                node(
                    "b",
                    NodeKind::Action(ActionNode {
                        kind: "noop".to_string(),
                        description: None,
                    }),
                ),
                end_node("end"),
            ],
            edges: vec![
                WorkflowEdge::new(id("start"), id("a")),
                WorkflowEdge::new(id("a"), id("b")),
                WorkflowEdge::new(id("b"), id("a")),
                // end is only reachable from nowhere
            ],
        };

        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_node_kind_serialization() {
        let node = node(
            "call",
            NodeKind::ModelCall(ModelCallNode {
                model: "fast".to_string(),
                prompt: "Summarize: {{input}}".to_string(),
                system_prompt: None,
                output_variable: "summary".to_string(),
                temperature: None,
                max_tokens: None,
            }),
        );

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "model_call");
        assert_eq!(json["id"], "call");

        let parsed: WorkflowNode = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn test_branch_label_serialization() {
        let edge = WorkflowEdge::new(id("check"), id("yes")).with_branch(BranchLabel::True);
        let json = serde_json::to_value(&edge).unwrap();

        assert_eq!(json["branch"], "true");
    }

    #[test]
    fn test_next_default_and_branch() {
        let wf = linear_workflow();

        assert_eq!(wf.next_default(&id("start")), Some(&id("act")));
        assert_eq!(wf.next_default(&id("end")), None);
        assert_eq!(wf.next_branch(&id("start"), true), None);
    }
}
