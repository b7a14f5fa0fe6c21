//! Error types for gate validation

use thiserror::Error;

/// Gate validation error enumeration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GateError {
    /// Command is not an assertion
    #[error("Not an assertion: {0}")]
    NotAnAssertion(String),

    /// Assertion command lacks a field the expectation needs
    #[error("Invalid expectation for '{command}': {reason}")]
    InvalidExpectation { command: String, reason: String },

    /// Regex or count pattern did not compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Page could not be observed
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn invalid(command: impl Into<String>, reason: impl Into<String>) -> Self {
        GateError::InvalidExpectation {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::ProbeFailed(_))
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            GateError::Internal(_) => 3,
            GateError::InvalidExpectation { .. } | GateError::InvalidPattern { .. } => 2,
            GateError::ProbeFailed(_) => 1,
            GateError::NotAnAssertion(_) => 0,
        }
    }
}
