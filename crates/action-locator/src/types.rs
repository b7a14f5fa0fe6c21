//! Core types for locator system

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use soultest_core_types::SelectorStrategy;

/// Element returned by a lookup backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Backend node reference
    pub id: String,

    /// Element tag name
    pub tag: Option<String>,

    /// Visible text content
    pub text: Option<String>,

    /// Whether element is visible
    pub visible: bool,

    /// Whether element is enabled
    pub enabled: bool,

    /// DOM attributes, including `value` for form fields
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            visible: true,
            enabled: true,
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// How one entry of the fallback chain fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// Resolved to an element
    Matched,

    /// Lookup succeeded but returned nothing within the wait
    NotFound,

    /// Wait bound elapsed
    TimedOut,

    /// Strategy needs a unique match and got several
    Ambiguous(usize),

    /// Selector value could not be mapped or the backend errored
    Failed(String),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Matched => f.write_str("matched"),
            AttemptOutcome::NotFound => f.write_str("not found"),
            AttemptOutcome::TimedOut => f.write_str("timed out"),
            AttemptOutcome::Ambiguous(count) => write!(f, "ambiguous, {count} matches"),
            AttemptOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// One strategy/value tried during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub strategy: SelectorStrategy,
    pub value: String,
    pub outcome: AttemptOutcome,
}

impl Attempt {
    pub fn new(strategy: SelectorStrategy, value: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            strategy,
            value: value.into(),
            outcome,
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.strategy, self.value, self.outcome)
    }
}

pub(crate) fn render_attempts(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(Attempt::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Element resolution result
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    /// Resolved element
    pub element: ElementHandle,

    /// Strategy that produced the match
    pub strategy: SelectorStrategy,

    /// Selector value that matched
    pub value: String,

    /// Position in the chain; 0 is the primary selector
    pub chain_index: usize,

    /// Attempts made, including the successful one
    pub attempts: Vec<Attempt>,
}

impl ResolutionResult {
    /// Whether a fallback rather than the primary selector matched
    pub fn from_fallback(&self) -> bool {
        self.chain_index > 0
    }
}

/// Bounds applied to every resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Wait bound for a single strategy attempt
    #[serde(with = "millis")]
    pub attempt_timeout: Duration,

    /// Delay between polls while waiting
    #[serde(with = "millis")]
    pub poll_interval: Duration,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_millis(2_000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
