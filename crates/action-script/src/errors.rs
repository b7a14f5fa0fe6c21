//! Error types for the command language

use thiserror::Error;

/// Errors raised while splitting a single line into tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A quoted value was opened but never closed
    #[error("unterminated {quote} quote starting at column {column}")]
    UnterminatedQuote { quote: char, column: usize },

    /// `fallback` keyword without a preceding selector
    #[error("'fallback' must follow an element selector")]
    DanglingFallback,

    /// `fallback` keyword not followed by `<strategy>=<value>`
    #[error("'fallback' must be followed by <strategy>=<value>, found {0}")]
    InvalidFallback(String),

    /// Bare word where `key=value` was expected
    #[error("expected key=value, found '{0}'")]
    MalformedToken(String),

    /// `=value` with nothing before the equals sign
    #[error("missing key before '=' in '{0}'")]
    EmptyKey(String),
}

/// Errors raised while turning tokens into a validated command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Token list was empty
    #[error("no tokens to parse")]
    NoTokens,

    /// Lexing failed on this line
    #[error("line {line}: {source}")]
    Lex {
        line: usize,
        #[source]
        source: LexError,
    },

    /// First token was not a command name
    #[error("line {line}: expected a command name, found {found}")]
    MissingCommand { line: usize, found: String },

    /// Command name not in the language
    #[error("line {line}: unknown command '{name}'")]
    UnknownCommand { line: usize, name: String },

    /// Element command without a selector
    #[error("line {line}: command '{command}' requires an element selector")]
    MissingSelector { line: usize, command: String },

    /// Selector supplied to a command that does not act on elements
    #[error("line {line}: command '{command}' does not take an element selector")]
    UnexpectedSelector { line: usize, command: String },

    /// Required parameter absent
    #[error("line {line}: command '{command}' requires parameter '{param}'")]
    MissingParam {
        line: usize,
        command: String,
        param: String,
    },

    /// Selector with an empty value
    #[error("line {line}: selector '{strategy}' has an empty value")]
    EmptySelector { line: usize, strategy: String },

    /// Same parameter given twice
    #[error("line {line}: duplicate parameter '{key}'")]
    DuplicateParam { line: usize, key: String },

    /// More than one primary selector
    #[error("line {line}: more than one element selector; use 'fallback' to chain alternatives")]
    DuplicateSelector { line: usize },
}

impl ParseError {
    /// 1-based source line, when the error is tied to one
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::NoTokens => None,
            ParseError::Lex { line, .. }
            | ParseError::MissingCommand { line, .. }
            | ParseError::UnknownCommand { line, .. }
            | ParseError::MissingSelector { line, .. }
            | ParseError::UnexpectedSelector { line, .. }
            | ParseError::MissingParam { line, .. }
            | ParseError::EmptySelector { line, .. }
            | ParseError::DuplicateParam { line, .. }
            | ParseError::DuplicateSelector { line } => Some(*line),
        }
    }
}
