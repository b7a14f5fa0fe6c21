//! Whole-document parsing

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use soultest_core_types::Command;
use tracing::debug;

use crate::errors::ParseError;
use crate::parser::parse_line;

/// Immutable, cheaply cloneable list of commands in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    commands: Arc<[Command]>,
}

impl Script {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            commands: commands.into(),
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Owned copy of the commands, for callers that build work units from them.
    pub fn to_vec(&self) -> Vec<Command> {
        self.commands.to_vec()
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Deref for Script {
    type Target = [Command];

    fn deref(&self) -> &Self::Target {
        &self.commands
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl From<Vec<Command>> for Script {
    fn from(commands: Vec<Command>) -> Self {
        Self::new(commands)
    }
}

/// One canonical line per command.
impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, command) in self.commands.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{command}")?;
        }
        Ok(())
    }
}

/// Parse a full document. The first failing line aborts the parse.
pub fn parse_content(content: &str) -> Result<Script, ParseError> {
    let mut commands = Vec::new();
    for (idx, source) in content.lines().enumerate() {
        if let Some(command) = parse_line(source, idx + 1)? {
            commands.push(command);
        }
    }
    debug!(count = commands.len(), "parsed script");
    Ok(Script::new(commands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soultest_core_types::CommandType;

    #[test]
    fn skips_comments_and_blank_lines() {
        let script = parse_content("# login flow\n\nnavigate url=https://x.test\n   \nreload\n")
            .unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script[0].command_type, CommandType::Navigate);
        assert_eq!(script[1].command_type, CommandType::Reload);
    }

    #[test]
    fn first_error_reports_its_line() {
        let err = parse_content("navigate url=https://x.test\n# ok\nclick\nteleport").unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn empty_document_is_an_empty_script() {
        let script = parse_content("").unwrap();
        assert!(script.is_empty());
        assert_eq!(script, Script::default());
    }

    #[test]
    fn display_reparses_to_same_commands() {
        let source = "navigate url=https://x.test\nfill css=#name text=\"Jane Doe\"\nclick text=Save fallback css=button.save";
        let script = parse_content(source).unwrap();
        let reparsed = parse_content(&script.to_string()).unwrap();
        assert_eq!(script, reparsed);
    }
}
