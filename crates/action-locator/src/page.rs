//! In-memory page model
//!
//! [`StaticPage`] answers [`ElementQuery`]s against a fixed element list and
//! captures [`PageSnapshot`]s of itself. It backs offline runs and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use soultest_core_types::{quote_if_needed, PageSnapshot, PageSnapshotProvider, SoulError};

use crate::{
    errors::LocatorError,
    lookup::{ElementLookup, ElementQuery},
    strategies::TEST_ID_ATTRIBUTE,
    types::ElementHandle,
};

/// Element plus the selectors it answers to.
#[derive(Debug, Clone, Default)]
pub struct PageElement {
    pub handle: ElementHandle,
    pub css: Vec<String>,
    pub xpath: Vec<String>,
    pub label: Option<String>,
    pub role: Option<String>,
}

impl PageElement {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        let mut handle = ElementHandle::new(id);
        handle.tag = Some(tag.into());
        Self {
            handle,
            ..Default::default()
        }
    }

    pub fn css(mut self, selector: impl Into<String>) -> Self {
        self.css.push(selector.into());
        self
    }

    pub fn xpath(mut self, expression: impl Into<String>) -> Self {
        self.xpath.push(expression.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.handle.text = Some(text.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.handle.attributes.insert(name.into(), value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.handle.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.handle.enabled = false;
        self
    }

    /// Explicit role, else the implicit role of the tag.
    pub fn effective_role(&self) -> Option<&str> {
        if let Some(role) = self.role.as_deref() {
            return Some(role);
        }
        match self.handle.tag.as_deref()? {
            "button" => Some("button"),
            "a" => Some("link"),
            "input" | "textarea" => Some("textbox"),
            "select" => Some("combobox"),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some("heading"),
            _ => None,
        }
    }

    fn accessible_name(&self) -> Option<&str> {
        self.handle
            .attribute("aria-label")
            .or(self.label.as_deref())
            .or(self.handle.text.as_deref())
    }

    fn matches(&self, query: &ElementQuery) -> bool {
        match query {
            ElementQuery::Css { selector } => self.css.iter().any(|s| s == selector),
            ElementQuery::XPath { expression } => self.xpath.iter().any(|x| x == expression),
            ElementQuery::Text { content, exact } => {
                self.handle.text.as_deref().is_some_and(|text| {
                    if *exact {
                        text.trim() == content
                    } else {
                        text.to_lowercase().contains(&content.to_lowercase())
                    }
                })
            }
            ElementQuery::Attribute { name, value } => {
                self.handle.attribute(name) == Some(value.as_str())
            }
            ElementQuery::Label { text } => self
                .label
                .as_deref()
                .is_some_and(|label| label.trim().eq_ignore_ascii_case(text)),
            ElementQuery::Role { role, name } => {
                self.effective_role() == Some(role.as_str())
                    && name.as_deref().map_or(true, |wanted| {
                        self.accessible_name()
                            .is_some_and(|actual| actual.trim().eq_ignore_ascii_case(wanted))
                    })
            }
        }
    }

    /// Command-language selectors that address this element.
    fn selector_hints(&self) -> Vec<String> {
        let mut hints: Vec<String> = self
            .css
            .iter()
            .map(|s| format!("css={}", quote_if_needed(s)))
            .collect();
        if let Some(id) = self.handle.attribute(TEST_ID_ATTRIBUTE) {
            hints.push(format!("testid={}", quote_if_needed(id)));
        }
        if let Some(placeholder) = self.handle.attribute("placeholder") {
            hints.push(format!("placeholder={}", quote_if_needed(placeholder)));
        }
        if let Some(label) = &self.label {
            hints.push(format!("label={}", quote_if_needed(label)));
        }
        if let Some(text) = self.handle.text.as_deref().filter(|t| !t.trim().is_empty()) {
            hints.push(format!("text={}", quote_if_needed(text.trim())));
        }
        hints
    }

    fn render(&self) -> String {
        let tag = self.handle.tag.as_deref().unwrap_or("div");
        let mut attrs = format!(" id=\"{}\"", self.handle.id);
        for (name, value) in &self.handle.attributes {
            attrs.push_str(&format!(" {name}=\"{value}\""));
        }
        if !self.handle.visible {
            attrs.push_str(" hidden");
        }
        if !self.handle.enabled {
            attrs.push_str(" disabled");
        }
        let text = self.handle.text.as_deref().unwrap_or_default();
        format!("<{tag}{attrs}>{text}</{tag}>")
    }
}

#[derive(Debug, Default)]
struct PageState {
    url: Option<String>,
    title: Option<String>,
    elements: Vec<PageElement>,
}

/// Mutable in-memory page.
#[derive(Debug, Default)]
pub struct StaticPage {
    state: RwLock<PageState>,
}

impl StaticPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements(elements: impl IntoIterator<Item = PageElement>) -> Self {
        let page = Self::new();
        page.state.write().elements.extend(elements);
        page
    }

    pub fn add(&self, element: PageElement) {
        self.state.write().elements.push(element);
    }

    /// Remove elements by id; returns how many were removed.
    pub fn remove(&self, id: &str) -> usize {
        let mut state = self.state.write();
        let before = state.elements.len();
        state.elements.retain(|e| e.handle.id != id);
        before - state.elements.len()
    }

    /// Replace the element list, keeping URL and title.
    pub fn replace(&self, elements: impl IntoIterator<Item = PageElement>) {
        self.state.write().elements = elements.into_iter().collect();
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state.write().url = Some(url.into());
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state.write().title = Some(title.into());
    }

    pub fn url(&self) -> Option<String> {
        self.state.read().url.clone()
    }

    pub fn title(&self) -> Option<String> {
        self.state.read().title.clone()
    }

    /// Set an attribute on every element with this id.
    pub fn set_attribute(&self, id: &str, name: &str, value: &str) -> usize {
        let mut state = self.state.write();
        let mut touched = 0;
        for element in state.elements.iter_mut().filter(|e| e.handle.id == id) {
            element
                .handle
                .attributes
                .insert(name.to_string(), value.to_string());
            touched += 1;
        }
        touched
    }

    /// Selector hints for every visible element, in document order.
    pub fn available_selectors(&self) -> Vec<String> {
        self.state
            .read()
            .elements
            .iter()
            .filter(|e| e.handle.visible)
            .flat_map(PageElement::selector_hints)
            .collect()
    }

    pub fn render_html(&self) -> String {
        let state = self.state.read();
        let title = state.title.as_deref().unwrap_or_default();
        let body = state
            .elements
            .iter()
            .map(PageElement::render)
            .collect::<Vec<_>>()
            .join("\n");
        format!("<html><head><title>{title}</title></head><body>\n{body}\n</body></html>")
    }
}

#[async_trait]
impl ElementLookup for StaticPage {
    async fn find(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>, LocatorError> {
        Ok(self
            .state
            .read()
            .elements
            .iter()
            .filter(|e| e.matches(query))
            .map(|e| e.handle.clone())
            .collect())
    }
}

#[async_trait]
impl PageSnapshotProvider for StaticPage {
    async fn capture(&self) -> Result<PageSnapshot, SoulError> {
        Ok(PageSnapshot {
            html: Some(self.render_html()),
            screenshot: None,
            available_selectors: self.available_selectors(),
        })
    }
}
