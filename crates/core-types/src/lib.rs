//! Shared primitives for the SoulTest execution engine.
//!
//! Every layer (script parser, locator, scheduler, flow orchestrator and the
//! self-healing loop) speaks in terms of the types defined here.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod command;
pub mod executor;
pub mod selector;
pub mod snapshot;

pub use command::{Command, CommandFamily, CommandType};
pub use executor::{CommandExecutor, CommandOutcome, NoopExecutor};
pub use selector::{quote_if_needed, SelectorSpec, SelectorStrategy};
pub use snapshot::{PageSnapshot, PageSnapshotProvider, StaticSnapshotProvider};

/// Error raised by external collaborators (executor backends, snapshot providers).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoulError {
    #[error("{message}")]
    Message { message: String },
}

impl SoulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SoulError::Message { message } => message,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Browser cookie as tracked by the execution context.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn soul_error_exposes_message() {
        let err = SoulError::new("backend went away");
        assert_eq!(err.message(), "backend went away");
        assert_eq!(err.to_string(), "backend went away");
    }
}
