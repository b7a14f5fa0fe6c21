//! Page snapshot collaborator used when analysing failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::SoulError;

/// What the page looked like at the moment a command failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Base64-encoded PNG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub available_selectors: Vec<String>,
}

#[async_trait]
pub trait PageSnapshotProvider: Send + Sync {
    async fn capture(&self) -> Result<PageSnapshot, SoulError>;
}

/// Provider returning a fixed snapshot; handy for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotProvider {
    snapshot: PageSnapshot,
}

impl StaticSnapshotProvider {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn with_selectors<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PageSnapshot {
            available_selectors: selectors.into_iter().map(Into::into).collect(),
            ..PageSnapshot::default()
        })
    }
}

#[async_trait]
impl PageSnapshotProvider for StaticSnapshotProvider {
    async fn capture(&self) -> Result<PageSnapshot, SoulError> {
        Ok(self.snapshot.clone())
    }
}
