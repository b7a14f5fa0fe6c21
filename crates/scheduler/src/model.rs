use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a scheduled unit.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    /// Never attempted because an ordering predecessor failed or was blocked.
    Blocked,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeStatus::Completed | NodeStatus::Failed | NodeStatus::Blocked
        )
    }

    /// Whether dependents of a node in this state can never run.
    pub fn poisons_dependents(self) -> bool {
        matches!(self, NodeStatus::Failed | NodeStatus::Blocked)
    }

    /// Allowed moves. `Failed`/`Blocked` may be reset to `Pending` for a rerun.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        use NodeStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Blocked)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (Failed, Pending)
                | (Blocked, Pending)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::InProgress => "in_progress",
            NodeStatus::Completed => "completed",
            NodeStatus::Failed => "failed",
            NodeStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct GraphNode<T> {
    pub id: String,
    pub payload: T,
    pub status: NodeStatus,
}

impl<T> GraphNode<T> {
    pub fn new(id: impl Into<String>, payload: T) -> Self {
        Self {
            id: id.into(),
            payload,
            status: NodeStatus::Pending,
        }
    }
}
