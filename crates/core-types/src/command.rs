//! Parsed command model for the line-oriented test language.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::selector::{quote_if_needed, SelectorSpec};

/// Coarse grouping of command kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandFamily {
    Navigation,
    Interaction,
    Form,
    Waiting,
    Assertion,
    Context,
}

/// Canonical command kinds. Aliases are resolved by the lexer and never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandType {
    Navigate,
    GoBack,
    GoForward,
    Reload,
    Click,
    Type,
    Fill,
    Press,
    Hover,
    DragDrop,
    Select,
    Check,
    Uncheck,
    SelectOption,
    UploadFile,
    Wait,
    WaitForSelector,
    WaitForUrl,
    WaitForLoadState,
    AssertVisible,
    AssertExists,
    AssertHidden,
    AssertNotExists,
    AssertText,
    AssertUrl,
    AssertCount,
    AssertEnabled,
    AssertDisabled,
    GetAttribute,
    GetText,
    Screenshot,
    SetVariable,
    GetVariable,
}

impl CommandType {
    pub const ALL: [CommandType; 33] = [
        CommandType::Navigate,
        CommandType::GoBack,
        CommandType::GoForward,
        CommandType::Reload,
        CommandType::Click,
        CommandType::Type,
        CommandType::Fill,
        CommandType::Press,
        CommandType::Hover,
        CommandType::DragDrop,
        CommandType::Select,
        CommandType::Check,
        CommandType::Uncheck,
        CommandType::SelectOption,
        CommandType::UploadFile,
        CommandType::Wait,
        CommandType::WaitForSelector,
        CommandType::WaitForUrl,
        CommandType::WaitForLoadState,
        CommandType::AssertVisible,
        CommandType::AssertExists,
        CommandType::AssertHidden,
        CommandType::AssertNotExists,
        CommandType::AssertText,
        CommandType::AssertUrl,
        CommandType::AssertCount,
        CommandType::AssertEnabled,
        CommandType::AssertDisabled,
        CommandType::GetAttribute,
        CommandType::GetText,
        CommandType::Screenshot,
        CommandType::SetVariable,
        CommandType::GetVariable,
    ];

    /// Canonical camel-case name.
    pub fn name(self) -> &'static str {
        match self {
            CommandType::Navigate => "navigate",
            CommandType::GoBack => "goBack",
            CommandType::GoForward => "goForward",
            CommandType::Reload => "reload",
            CommandType::Click => "click",
            CommandType::Type => "type",
            CommandType::Fill => "fill",
            CommandType::Press => "press",
            CommandType::Hover => "hover",
            CommandType::DragDrop => "dragDrop",
            CommandType::Select => "select",
            CommandType::Check => "check",
            CommandType::Uncheck => "uncheck",
            CommandType::SelectOption => "selectOption",
            CommandType::UploadFile => "uploadFile",
            CommandType::Wait => "wait",
            CommandType::WaitForSelector => "waitForSelector",
            CommandType::WaitForUrl => "waitForUrl",
            CommandType::WaitForLoadState => "waitForLoadState",
            CommandType::AssertVisible => "assertVisible",
            CommandType::AssertExists => "assertExists",
            CommandType::AssertHidden => "assertHidden",
            CommandType::AssertNotExists => "assertNotExists",
            CommandType::AssertText => "assertText",
            CommandType::AssertUrl => "assertUrl",
            CommandType::AssertCount => "assertCount",
            CommandType::AssertEnabled => "assertEnabled",
            CommandType::AssertDisabled => "assertDisabled",
            CommandType::GetAttribute => "getAttribute",
            CommandType::GetText => "getText",
            CommandType::Screenshot => "screenshot",
            CommandType::SetVariable => "setVariable",
            CommandType::GetVariable => "getVariable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn family(self) -> CommandFamily {
        use CommandType::*;
        match self {
            Navigate | GoBack | GoForward | Reload => CommandFamily::Navigation,
            Click | Type | Fill | Press | Hover | DragDrop | Select => CommandFamily::Interaction,
            Check | Uncheck | SelectOption | UploadFile => CommandFamily::Form,
            Wait | WaitForSelector | WaitForUrl | WaitForLoadState => CommandFamily::Waiting,
            AssertVisible | AssertExists | AssertHidden | AssertNotExists | AssertText
            | AssertUrl | AssertCount | AssertEnabled | AssertDisabled => {
                CommandFamily::Assertion
            }
            GetAttribute | GetText | Screenshot | SetVariable | GetVariable => {
                CommandFamily::Context
            }
        }
    }

    pub fn is_assertion(self) -> bool {
        self.family() == CommandFamily::Assertion
    }

    /// Whether the command acts on an element and therefore needs a selector.
    pub fn requires_selector(self) -> bool {
        use CommandType::*;
        matches!(
            self,
            Click
                | Type
                | Fill
                | Hover
                | DragDrop
                | Select
                | Check
                | Uncheck
                | SelectOption
                | UploadFile
                | WaitForSelector
                | AssertVisible
                | AssertExists
                | AssertHidden
                | AssertNotExists
                | AssertText
                | AssertCount
                | AssertEnabled
                | AssertDisabled
                | GetAttribute
                | GetText
        )
    }

    /// Whether an element selector may be supplied at all.
    pub fn accepts_selector(self) -> bool {
        self.requires_selector() || matches!(self, CommandType::Press | CommandType::Screenshot)
    }

    /// Required parameters. Each inner slice lists interchangeable keys, one of which must be present.
    pub fn required_params(self) -> &'static [&'static [&'static str]] {
        use CommandType::*;
        match self {
            Navigate => &[&["url"]],
            Type | Fill => &[&["text", "value"]],
            Press => &[&["key"]],
            DragDrop => &[&["target"]],
            Select => &[&["value"]],
            SelectOption => &[&["value", "label"]],
            UploadFile => &[&["path"]],
            Wait => &[&["ms", "duration"]],
            WaitForUrl => &[&["pattern", "url"]],
            AssertText => &[&["expected", "text"]],
            AssertUrl => &[&["expected", "pattern"]],
            AssertCount => &[&["count", "expected"]],
            GetAttribute => &[&["attribute", "name"]],
            SetVariable => &[&["name"], &["value"]],
            GetVariable => &[&["name"]],
            _ => &[],
        }
    }

    /// Commands whose success changes observable page or context state.
    pub fn has_side_effects(self) -> bool {
        use CommandType::*;
        matches!(
            self,
            Navigate
                | GoBack
                | GoForward
                | Reload
                | Type
                | Fill
                | SetVariable
                | GetText
                | GetAttribute
                | GetVariable
        )
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parsed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorSpec>,
}

impl Command {
    pub fn new(command_type: CommandType) -> Self {
        Self {
            command_type,
            params: BTreeMap::new(),
            selector: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_selector(mut self, selector: SelectorSpec) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First present value among interchangeable keys.
    pub fn param_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.param(key))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_type.name())?;
        if let Some(selector) = &self.selector {
            write!(f, " {selector}")?;
        }
        for (key, value) in &self.params {
            write!(f, " {key}={}", quote_if_needed(value))?;
        }
        Ok(())
    }
}
