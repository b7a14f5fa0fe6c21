//! Element selector specification with an ordered fallback chain.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Element lookup strategy recognised by the command language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorStrategy {
    Css,
    Xpath,
    Text,
    Placeholder,
    Label,
    Role,
    #[serde(rename = "testid")]
    TestId,
}

impl SelectorStrategy {
    pub const ALL: [SelectorStrategy; 7] = [
        SelectorStrategy::Css,
        SelectorStrategy::Xpath,
        SelectorStrategy::Text,
        SelectorStrategy::Placeholder,
        SelectorStrategy::Label,
        SelectorStrategy::Role,
        SelectorStrategy::TestId,
    ];

    /// Keyword used in source text (`css=...`).
    pub fn keyword(self) -> &'static str {
        match self {
            SelectorStrategy::Css => "css",
            SelectorStrategy::Xpath => "xpath",
            SelectorStrategy::Text => "text",
            SelectorStrategy::Placeholder => "placeholder",
            SelectorStrategy::Label => "label",
            SelectorStrategy::Role => "role",
            SelectorStrategy::TestId => "testid",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.keyword() == keyword)
    }

    /// Strategies whose matches must be unique for the caller to act on them.
    pub fn requires_unique_match(self) -> bool {
        matches!(self, SelectorStrategy::Text | SelectorStrategy::Label)
    }
}

impl fmt::Display for SelectorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Primary selector plus alternates tried in order when the primary fails.
///
/// `exact` marks a `text` selector whose value was quoted in source
/// (`text="Login"`): it matches the whole trimmed text instead of a substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSpec {
    pub strategy: SelectorStrategy,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exact: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<SelectorSpec>,
}

impl SelectorSpec {
    pub fn new(strategy: SelectorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
            exact: false,
            fallbacks: Vec::new(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::Css, value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::Text, value)
    }

    pub fn exact_text(value: impl Into<String>) -> Self {
        Self {
            exact: true,
            ..Self::text(value)
        }
    }

    pub fn with_fallback(mut self, fallback: SelectorSpec) -> Self {
        self.fallbacks.push(fallback);
        self
    }

    /// Primary first, then every fallback depth-first in declaration order.
    /// Each entry's own `fallbacks` are already flattened into the list.
    pub fn chain(&self) -> Vec<&SelectorSpec> {
        let mut out = vec![self];
        for fallback in &self.fallbacks {
            out.extend(fallback.chain());
        }
        out
    }

    /// Value as it is written in a script.
    pub fn source_value(&self) -> String {
        if self.exact {
            quote(&self.value)
        } else {
            quote_if_needed(&self.value)
        }
    }

    /// Stable key used when recording values typed into this element.
    pub fn key(&self) -> String {
        format!("{}={}", self.strategy.keyword(), self.value)
    }
}

impl fmt::Display for SelectorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.source_value())?;
        for fallback in &self.fallbacks {
            write!(f, " fallback {fallback}")?;
        }
        Ok(())
    }
}

/// Quote a value so the lexer reads it back as a single token.
pub fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'');
    if !needs_quotes {
        return value.to_string();
    }
    quote(value)
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
