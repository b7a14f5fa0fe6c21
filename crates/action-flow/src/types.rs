//! Core types for flow orchestration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soultest_core_types::Command;
use soultest_scheduler::NodeStatus;
use std::collections::BTreeMap;
use std::time::Duration;

/// Subtask lifecycle. Shares the scheduler's state machine.
pub type SubtaskStatus = NodeStatus;

/// Ordered command list with its own lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    /// Unique identifier
    pub id: String,

    /// Human description
    pub description: String,

    /// Commands, run in order
    pub commands: Vec<Command>,

    /// Current lifecycle state
    pub status: SubtaskStatus,

    /// Outcome of the last run
    pub result: Option<SubtaskResult>,
}

impl Subtask {
    /// Create a pending subtask
    pub fn new(id: impl Into<String>, description: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            commands,
            status: SubtaskStatus::Pending,
            result: None,
        }
    }
}

/// Recorded outcome of a subtask run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskResult {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Ordered group of subtasks with optional setup and teardown commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier
    pub id: String,

    /// Human description
    pub description: String,

    /// Subtasks in execution order
    pub subtask_ids: Vec<String>,

    /// Runs before the first subtask
    pub setup: Option<Vec<Command>>,

    /// Runs exactly once after everything else
    pub teardown: Option<Vec<Command>>,
}

impl Task {
    /// Create a task over the given subtasks
    pub fn new<I, S>(id: impl Into<String>, description: impl Into<String>, subtask_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            description: description.into(),
            subtask_ids: subtask_ids.into_iter().map(Into::into).collect(),
            setup: None,
            teardown: None,
        }
    }

    /// Set setup commands
    pub fn with_setup(mut self, commands: Vec<Command>) -> Self {
        self.setup = Some(commands);
        self
    }

    /// Set teardown commands
    pub fn with_teardown(mut self, commands: Vec<Command>) -> Self {
        self.teardown = Some(commands);
        self
    }
}

/// Result of executing a subtask or a task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionReport {
    pub success: bool,
    pub duration: Duration,
    pub error: Option<String>,
    /// Commands dispatched, including the one that failed
    pub executed: usize,
    /// First command that failed
    pub failed_command: Option<Command>,
}

impl ExecutionReport {
    pub(crate) fn succeeded(duration: Duration, executed: usize) -> Self {
        Self {
            success: true,
            duration,
            error: None,
            executed,
            failed_command: None,
        }
    }

    pub(crate) fn failed(
        duration: Duration,
        executed: usize,
        error: impl Into<String>,
        failed_command: Option<Command>,
    ) -> Self {
        Self {
            success: false,
            duration,
            error: Some(error.into()),
            executed,
            failed_command,
        }
    }
}

/// Final state of one task in a suite run.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: NodeStatus,
    /// Absent for tasks that never ran
    pub report: Option<ExecutionReport>,
}

/// Per-task outcomes of a suite run, in execution order followed by blocked tasks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<TaskOutcome>,
    pub duration: Duration,
}

impl SuiteReport {
    pub fn success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| outcome.status == NodeStatus::Completed)
    }

    pub fn outcome(&self, task_id: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|outcome| outcome.task_id == task_id)
    }

    pub fn count(&self, status: NodeStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == status)
            .count()
    }
}
