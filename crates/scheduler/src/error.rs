use thiserror::Error;

use crate::model::NodeStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node '{0}' already exists")]
    DuplicateNode(String),
    #[error("node '{0}' does not exist")]
    UnknownNode(String),
    #[error("edge {0} -> {0} would make the node depend on itself")]
    SelfLoop(String),
    #[error("edge {from} -> {to} would create a cycle: {}", .path.join(" -> "))]
    Cycle {
        from: String,
        to: String,
        path: Vec<String>,
    },
    #[error("node '{id}' cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: NodeStatus,
        to: NodeStatus,
    },
    #[error("graph contains a cycle through {0:?}")]
    CycleDetected(Vec<String>),
}

impl GraphError {
    pub fn is_cycle(&self) -> bool {
        matches!(
            self,
            GraphError::SelfLoop(_) | GraphError::Cycle { .. } | GraphError::CycleDetected(_)
        )
    }
}
