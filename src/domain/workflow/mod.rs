pub mod context;
pub mod definition;
pub mod error;
pub mod executor;
pub mod trace;

pub use context::ExecutionContext;
pub use definition::{
    ActionNode, BranchLabel, ConditionalNode, EndNode, ModelCallNode, NodeId, NodeKind,
    RetrievalNode, WorkflowDefinition, WorkflowEdge, WorkflowId, WorkflowNode,
};
pub use error::WorkflowError;
pub use executor::{CallerIdentity, WorkflowExecutor, WorkflowRunFailure, WorkflowRunResult};
pub use trace::{ExecutionTrace, NodeTraceEntry};
