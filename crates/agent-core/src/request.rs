use serde::{Deserialize, Serialize};

/// Everything a generation service needs to propose a repaired script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairRequest {
    pub test_name: String,
    /// Script text that failed
    pub content: String,
    pub error_message: String,
    /// Canonical rendering of the failing command, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_command: Option<String>,
    /// Failure category label, e.g. `SELECTOR_NOT_FOUND`
    pub category: String,
    #[serde(default)]
    pub available_selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_html: Option<String>,
    /// Earlier failed attempts, oldest first
    #[serde(default)]
    pub previous_attempts: Vec<AttemptSummary>,
}

/// Compact record of one earlier failed attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub attempt: u32,
    pub category: String,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_command: Option<String>,
}

impl AttemptSummary {
    /// One-line rendering used in prompts.
    pub fn render(&self) -> String {
        match &self.failed_command {
            Some(command) => format!(
                "attempt {} [{}] `{}`: {}",
                self.attempt, self.category, command, self.error_message
            ),
            None => format!(
                "attempt {} [{}]: {}",
                self.attempt, self.category, self.error_message
            ),
        }
    }
}

/// Text produced by a generation service, with token usage when reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}
