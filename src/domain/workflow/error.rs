//! Workflow errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow validation failed: {message}")]
    Validation { message: String },

    #[error("Circular dependency detected at node '{node}'")]
    CircularDependency { node: String },

    #[error("Node '{node}' failed: {message}")]
    NodeExecution { node: String, message: String },

    #[error("Conditional node '{node}' has no '{branch}' edge")]
    MissingBranch { node: String, branch: String },
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn circular_dependency(node: impl Into<String>) -> Self {
        Self::CircularDependency { node: node.into() }
    }

    pub fn node_execution(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NodeExecution {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn missing_branch(node: impl Into<String>, branch: impl Into<String>) -> Self {
        Self::MissingBranch {
            node: node.into(),
            branch: branch.into(),
        }
    }
}
