//! Failure analysis: turns a failed attempt into a classified, page-aware record.

use std::fmt;

use agent_core::AttemptSummary;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use soultest_core_types::{Command, PageSnapshotProvider};
use tracing::{debug, warn};

static SELECTOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(not found|no such element|unable to locate|could not (find|locate)|failed to (find|locate)|no element matche[sd]|multiple elements|ambiguous|invalid selector)",
    )
    .expect("selector regex")
});

static TIMEOUT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(timed?[ -]?out|deadline exceeded|exceeded \d+\s*ms)")
        .expect("timeout regex")
});

static MISMATCH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(expected\b.*\bbut (got|was|found)\b|expected\b.*\bactual\b)")
        .expect("mismatch regex")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCategory {
    SelectorNotFound,
    Timeout,
    AssertionMismatch,
    Other,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::SelectorNotFound => "SELECTOR_NOT_FOUND",
            FailureCategory::Timeout => "TIMEOUT",
            FailureCategory::AssertionMismatch => "ASSERTION_MISMATCH",
            FailureCategory::Other => "OTHER",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about one failed attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureContext {
    pub error_message: String,
    pub failed_command: Option<Command>,
    pub category: FailureCategory,
    pub available_selectors: Vec<String>,
    pub page_html: Option<String>,
    pub screenshot: Option<String>,
    /// 1-based attempt that produced this failure
    pub attempt_index: u32,
}

impl FailureContext {
    /// Compact form used when describing earlier attempts.
    pub fn summary(&self) -> AttemptSummary {
        AttemptSummary {
            attempt: self.attempt_index,
            category: self.category.as_str().to_string(),
            error_message: self.error_message.clone(),
            failed_command: self.failed_command.as_ref().map(ToString::to_string),
        }
    }
}

/// What to capture from the page besides the selector list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub capture_html: bool,
    pub capture_screenshot: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FailureAnalyzer {
    options: CaptureOptions,
}

impl FailureAnalyzer {
    pub fn new(options: CaptureOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CaptureOptions {
        self.options
    }

    /// Classify an error message. Mismatch wording only counts for assertions.
    pub fn classify(error: &str, command: Option<&Command>) -> FailureCategory {
        if SELECTOR_PATTERN.is_match(error) {
            FailureCategory::SelectorNotFound
        } else if TIMEOUT_PATTERN.is_match(error) {
            FailureCategory::Timeout
        } else if command.is_some_and(|c| c.command_type.is_assertion())
            && MISMATCH_PATTERN.is_match(error)
        {
            FailureCategory::AssertionMismatch
        } else {
            FailureCategory::Other
        }
    }

    /// Build the failure record for a failed command, consulting the page.
    pub async fn analyze(
        &self,
        command: Option<&Command>,
        error: &str,
        snapshots: &dyn PageSnapshotProvider,
        attempt_index: u32,
    ) -> FailureContext {
        let category = Self::classify(error, command);
        debug!(attempt = attempt_index, %category, "classified failure");

        let snapshot = match snapshots.capture().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Failed to capture page snapshot: {}", err);
                Default::default()
            }
        };

        FailureContext {
            error_message: error.to_string(),
            failed_command: command.cloned(),
            category,
            available_selectors: snapshot.available_selectors,
            page_html: snapshot.html.filter(|_| self.options.capture_html),
            screenshot: snapshot.screenshot.filter(|_| self.options.capture_screenshot),
            attempt_index,
        }
    }

    /// Failure record for a candidate that did not parse.
    pub fn parse_failure(&self, error: &str, attempt_index: u32) -> FailureContext {
        FailureContext {
            error_message: error.to_string(),
            failed_command: None,
            category: FailureCategory::Other,
            available_selectors: Vec::new(),
            page_html: None,
            screenshot: None,
            attempt_index,
        }
    }
}
