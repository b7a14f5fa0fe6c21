//! Flow Orchestration Layer
//!
//! Runs subtasks (ordered command lists) and tasks (ordered subtasks with
//! setup and teardown) over an external [`CommandExecutor`], tracking each
//! subtask's lifecycle and keeping the execution context current. Suites
//! add task-level ordering through the scheduler's dependency graph.
//!
//! [`CommandExecutor`]: soultest_core_types::CommandExecutor

pub mod errors;
pub mod executor;
pub mod suite;
pub mod types;

pub use errors::FlowError;
pub use executor::Orchestrator;
pub use suite::{SubtaskEntry, Suite, SuiteManifest, TaskEntry};
pub use types::{
    ExecutionReport, Subtask, SubtaskResult, SubtaskStatus, Task, TaskOutcome, SuiteReport,
};
