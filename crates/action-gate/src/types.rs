//! Core types for the assertion gate

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Page state gathered for one expectation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Number of elements matched by the expectation's selector
    pub element_count: usize,

    /// Visibility of the first match
    pub visible: bool,

    /// Enabled state of the first match
    pub enabled: bool,

    /// Text of the first match
    pub text: Option<String>,

    /// Current page URL
    pub url: Option<String>,
}

/// Outcome of evaluating one expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
    pub actual: String,
    pub expected: String,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            passed: true,
            actual: message.clone(),
            expected: message.clone(),
            message,
        }
    }

    /// State mismatch: "expected X to be hidden but got visible".
    pub fn fail(subject: &str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        let (expected, actual) = (expected.into(), actual.into());
        Self {
            passed: false,
            message: format!("expected {subject} to be {expected} but got {actual}"),
            actual,
            expected,
        }
    }

    /// Value mismatch: "expected X to have text \"a\" but got text \"b\"".
    pub fn mismatch(subject: &str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        let (expected, actual) = (expected.into(), actual.into());
        Self {
            passed: false,
            message: format!("expected {subject} to have {expected} but got {actual}"),
            actual,
            expected,
        }
    }
}

/// Polling bounds for assertions that may settle after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2_000),
            poll_interval: Duration::from_millis(100),
        }
    }
}
