//! Command language front-end
//!
//! Turns line-oriented test scripts into validated [`Command`] lists:
//! - [`lexer`] splits one line into command, selector and parameter tokens
//!   and canonicalises command aliases
//! - [`parser`] validates one line's tokens into a [`Command`]
//! - [`content`] drives both over a whole document, failing fast with the
//!   offending line number

pub mod content;
pub mod errors;
pub mod lexer;
pub mod parser;

pub use content::{parse_content, Script};
pub use errors::{LexError, ParseError};
pub use lexer::{canonical_command_name, tokenize, SelectorToken, Token};
pub use parser::{parse_line, parse_tokens};

pub use soultest_core_types::{Command, CommandType, SelectorSpec, SelectorStrategy};
