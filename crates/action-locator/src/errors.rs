//! Error types for locator system

use thiserror::Error;

use crate::types::{render_attempts, Attempt};

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    /// Every entry of the fallback chain was tried without a usable match
    #[error("Element not found: tried {}", render_attempts(.tried))]
    ElementNotFound { tried: Vec<Attempt> },

    /// Multiple elements match where a unique match is required
    #[error("Multiple elements match {selector} ({count} matches)")]
    AmbiguousMatch { selector: String, count: usize },

    /// Selector value cannot be turned into a query
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Lookup backend failed for one strategy
    #[error("Strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    /// Wait bound elapsed before the element appeared
    #[error("Resolution timeout: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LocatorError {
    pub fn strategy_failed(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        LocatorError::StrategyFailed {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LocatorError::Timeout(_) | LocatorError::StrategyFailed { .. }
        )
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::Internal(_) => 3,
            LocatorError::Timeout(_) | LocatorError::StrategyFailed { .. } => 2,
            LocatorError::ElementNotFound { .. } | LocatorError::AmbiguousMatch { .. } => 1,
            LocatorError::InvalidSelector(_) => 0,
        }
    }
}
