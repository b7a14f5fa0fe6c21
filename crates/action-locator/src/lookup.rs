//! Backend seam: concrete element queries

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{errors::LocatorError, types::ElementHandle};

/// Concrete query a strategy maps a selector value to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementQuery {
    Css { selector: String },
    XPath { expression: String },
    Text { content: String, exact: bool },
    Attribute { name: String, value: String },
    Label { text: String },
    Role { role: String, name: Option<String> },
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementQuery::Css { selector } => write!(f, "css {selector}"),
            ElementQuery::XPath { expression } => write!(f, "xpath {expression}"),
            ElementQuery::Text { content, exact } => {
                write!(f, "text {content:?}{}", if *exact { " (exact)" } else { "" })
            }
            ElementQuery::Attribute { name, value } => write!(f, "[{name}={value:?}]"),
            ElementQuery::Label { text } => write!(f, "label {text:?}"),
            ElementQuery::Role { role, name: None } => write!(f, "role {role}"),
            ElementQuery::Role {
                role,
                name: Some(name),
            } => write!(f, "role {role} name {name:?}"),
        }
    }
}

/// Element query executed by the browser backend.
///
/// Returns every current match in document order; an empty list means
/// "not yet present" and the resolver keeps polling until its wait bound.
#[async_trait]
pub trait ElementLookup: Send + Sync {
    async fn find(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>, LocatorError>;
}
