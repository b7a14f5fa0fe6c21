//! Element resolution strategies
//!
//! One strategy per selector keyword. Each turns the raw selector value into
//! an [`ElementQuery`] for the lookup backend:
//! - `css`, `xpath` pass the value through
//! - `text` matches visible text; a quoted script value (or a value still
//!   wrapped in quotes) is exact, anything else is a substring match
//! - `placeholder`, `testid` become attribute queries
//! - `label` matches the associated label text
//! - `role` accepts `button` or `button[name="Sign in"]`

use soultest_core_types::{SelectorSpec, SelectorStrategy};

use crate::{errors::LocatorError, lookup::ElementQuery};

/// Attribute used for test-id lookup.
pub const TEST_ID_ATTRIBUTE: &str = "data-testid";

/// Strategy trait for element resolution
pub trait Strategy: Send + Sync {
    /// Map a selector value to a backend query
    fn query(&self, value: &str) -> Result<ElementQuery, LocatorError>;

    /// Query for a value that must match exactly
    fn query_exact(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        self.query(value)
    }

    /// Get strategy type
    fn strategy_type(&self) -> SelectorStrategy;

    /// Whether several matches make the selector unusable
    fn requires_unique_match(&self) -> bool {
        self.strategy_type().requires_unique_match()
    }

    /// Get strategy name
    fn name(&self) -> &'static str {
        self.strategy_type().keyword()
    }
}

/// CSS selector strategy
pub struct CssStrategy;

impl Strategy for CssStrategy {
    fn query(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        Ok(ElementQuery::Css {
            selector: non_empty(value, "Empty CSS selector")?.to_string(),
        })
    }

    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::Css
    }
}

/// XPath expression strategy
pub struct XPathStrategy;

impl Strategy for XPathStrategy {
    fn query(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        let expression = non_empty(value, "Empty XPath expression")?;
        if !(expression.starts_with('/') || expression.starts_with('(') || expression.starts_with('.')) {
            return Err(LocatorError::InvalidSelector(format!(
                "XPath must start with '/', '.' or '(': {expression}"
            )));
        }
        Ok(ElementQuery::XPath {
            expression: expression.to_string(),
        })
    }

    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::Xpath
    }
}

/// Visible text strategy
pub struct TextStrategy;

impl Strategy for TextStrategy {
    fn query(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        let value = non_empty(value, "Empty text selector")?;
        let (content, exact) = match strip_wrapping_quotes(value) {
            Some(inner) => (inner, true),
            None => (value, false),
        };
        Ok(ElementQuery::Text {
            content: content.to_string(),
            exact,
        })
    }

    fn query_exact(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        Ok(ElementQuery::Text {
            content: non_empty(value, "Empty text selector")?.to_string(),
            exact: true,
        })
    }

    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::Text
    }
}

/// Placeholder attribute strategy
pub struct PlaceholderStrategy;

impl Strategy for PlaceholderStrategy {
    fn query(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        Ok(ElementQuery::Attribute {
            name: "placeholder".to_string(),
            value: non_empty(value, "Empty placeholder")?.to_string(),
        })
    }

    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::Placeholder
    }
}

/// Form label strategy
pub struct LabelStrategy;

impl Strategy for LabelStrategy {
    fn query(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        Ok(ElementQuery::Label {
            text: non_empty(value, "Empty label")?.to_string(),
        })
    }

    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::Label
    }
}

/// ARIA role strategy
pub struct RoleStrategy;

impl Strategy for RoleStrategy {
    fn query(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        let value = non_empty(value, "Empty ARIA role")?;
        let Some(open) = value.find('[') else {
            return Ok(ElementQuery::Role {
                role: value.to_string(),
                name: None,
            });
        };
        let role = value[..open].trim();
        let filter = value[open + 1..]
            .strip_suffix(']')
            .ok_or_else(|| LocatorError::InvalidSelector(format!("Unclosed role filter: {value}")))?;
        let name = filter
            .trim()
            .strip_prefix("name=")
            .ok_or_else(|| {
                LocatorError::InvalidSelector(format!("Role filter must be name=...: {value}"))
            })?
            .trim();
        let name = strip_wrapping_quotes(name).unwrap_or(name);
        if role.is_empty() || name.is_empty() {
            return Err(LocatorError::InvalidSelector(format!(
                "Role selector needs a role and a name: {value}"
            )));
        }
        Ok(ElementQuery::Role {
            role: role.to_string(),
            name: Some(name.to_string()),
        })
    }

    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::Role
    }
}

/// Test id attribute strategy
pub struct TestIdStrategy;

impl Strategy for TestIdStrategy {
    fn query(&self, value: &str) -> Result<ElementQuery, LocatorError> {
        Ok(ElementQuery::Attribute {
            name: TEST_ID_ATTRIBUTE.to_string(),
            value: non_empty(value, "Empty test id")?.to_string(),
        })
    }

    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::TestId
    }
}

/// Strategy implementation for a selector keyword
pub fn strategy_for(strategy: SelectorStrategy) -> &'static dyn Strategy {
    match strategy {
        SelectorStrategy::Css => &CssStrategy,
        SelectorStrategy::Xpath => &XPathStrategy,
        SelectorStrategy::Text => &TextStrategy,
        SelectorStrategy::Placeholder => &PlaceholderStrategy,
        SelectorStrategy::Label => &LabelStrategy,
        SelectorStrategy::Role => &RoleStrategy,
        SelectorStrategy::TestId => &TestIdStrategy,
    }
}

/// Backend query for one chain entry, ignoring its fallbacks
pub fn query_for(selector: &SelectorSpec) -> Result<ElementQuery, LocatorError> {
    let strategy = strategy_for(selector.strategy);
    if selector.exact {
        strategy.query_exact(&selector.value)
    } else {
        strategy.query(&selector.value)
    }
}

fn non_empty<'a>(value: &'a str, message: &str) -> Result<&'a str, LocatorError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LocatorError::InvalidSelector(message.to_string()));
    }
    Ok(trimmed)
}

fn strip_wrapping_quotes(value: &str) -> Option<&str> {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
}
