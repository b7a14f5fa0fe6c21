//! Flow orchestration error types

use soultest_scheduler::{GraphError, NodeStatus};
use thiserror::Error;

/// Orchestration errors.
///
/// Command failures are not errors: they end up in an
/// [`ExecutionReport`](crate::ExecutionReport). These cover misuse of the
/// orchestrator and malformed suite manifests.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Subtask id registered twice
    #[error("Subtask {0} is already registered")]
    DuplicateSubtask(String),

    /// Subtask id not registered
    #[error("Unknown subtask: {0}")]
    UnknownSubtask(String),

    /// Task id defined twice in a suite
    #[error("Task {0} is defined more than once")]
    DuplicateTask(String),

    /// Subtask state machine refused a move
    #[error("Subtask {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: NodeStatus,
        to: NodeStatus,
    },

    /// Suite manifest is structurally wrong
    #[error("Invalid suite: {0}")]
    InvalidSuite(String),

    /// Embedded script failed to parse
    #[error("Script for {owner} failed to parse: {source}")]
    Script {
        owner: String,
        #[source]
        source: action_script::ParseError,
    },

    /// Task ordering graph rejected the suite
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Manifest could not be read
    #[error("Failed to read suite: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest YAML malformed
    #[error("Failed to parse suite: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FlowError {
    pub fn script(owner: impl Into<String>, source: action_script::ParseError) -> Self {
        FlowError::Script {
            owner: owner.into(),
            source,
        }
    }
}
