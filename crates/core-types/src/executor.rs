//! Single-command executor seam implemented by browser backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::command::Command;

/// Result of running one command against a live session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Value produced by read commands (`getText`, `getAttribute`, `getVariable`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl CommandOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            output: None,
        }
    }

    pub fn ok_with_output(output: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            output: Some(output.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            output: None,
        }
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown error")
    }
}

/// Runs one command against a live browser session.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &Command) -> CommandOutcome;
}

/// Executor that accepts every command without touching a browser.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoopExecutor;

#[async_trait]
impl CommandExecutor for NoopExecutor {
    async fn execute(&self, _command: &Command) -> CommandOutcome {
        CommandOutcome::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandType;

    #[tokio::test]
    async fn noop_executor_always_succeeds() {
        let outcome = NoopExecutor
            .execute(&Command::new(CommandType::Reload))
            .await;
        assert!(outcome.success);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn failed_outcome_carries_message() {
        let outcome = CommandOutcome::failed("element not found");
        assert!(!outcome.success);
        assert_eq!(outcome.error_message(), "element not found");
        assert_eq!(CommandOutcome::default().error_message(), "unknown error");
    }
}
