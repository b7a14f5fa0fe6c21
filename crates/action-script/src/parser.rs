//! Command parser: one line's tokens into a validated [`Command`]

use std::collections::BTreeMap;

use soultest_core_types::{Command, CommandType};
use tracing::debug;

use crate::errors::ParseError;
use crate::lexer::{tokenize, SelectorToken, Token};

/// Lex and parse one source line. Blank and comment lines produce `Ok(None)`.
pub fn parse_line(source: &str, line: usize) -> Result<Option<Command>, ParseError> {
    let tokens = tokenize(source).map_err(|source| ParseError::Lex { line, source })?;
    if tokens.is_empty() {
        return Ok(None);
    }
    parse_tokens(tokens, line).map(Some)
}

/// Build a command from tokens, enforcing per-type required fields.
pub fn parse_tokens(tokens: Vec<Token>, line: usize) -> Result<Command, ParseError> {
    let mut tokens = tokens.into_iter();
    let name = match tokens.next() {
        None => return Err(ParseError::NoTokens),
        Some(Token::Command(name)) => name,
        Some(Token::Selector(selector)) => {
            return Err(ParseError::MissingCommand {
                line,
                found: format!("selector '{}={}'", selector.strategy, selector.value),
            })
        }
        Some(Token::Param { key, value }) => {
            return Err(ParseError::MissingCommand {
                line,
                found: format!("parameter '{key}={value}'"),
            })
        }
    };

    let command_type = CommandType::from_name(&name)
        .ok_or_else(|| ParseError::UnknownCommand { line, name })?;

    let mut selector: Option<SelectorToken> = None;
    let mut params = BTreeMap::new();
    for token in tokens {
        match token {
            Token::Command(extra) => {
                return Err(ParseError::MissingCommand {
                    line,
                    found: format!("second command '{extra}'"),
                })
            }
            Token::Selector(token) => {
                if selector.is_some() {
                    return Err(ParseError::DuplicateSelector { line });
                }
                selector = Some(token);
            }
            Token::Param { key, value } => {
                if params.contains_key(&key) {
                    return Err(ParseError::DuplicateParam { line, key });
                }
                params.insert(key, value);
            }
        }
    }

    let command_name = command_type.name().to_string();
    if let Some(selector) = &selector {
        if !command_type.accepts_selector() {
            return Err(ParseError::UnexpectedSelector {
                line,
                command: command_name,
            });
        }
        ensure_selector_values(selector, line)?;
    } else if command_type.requires_selector() {
        return Err(ParseError::MissingSelector {
            line,
            command: command_name,
        });
    }

    for alternatives in command_type.required_params() {
        if !alternatives.iter().any(|key| params.contains_key(*key)) {
            return Err(ParseError::MissingParam {
                line,
                command: command_name,
                param: alternatives.join("|"),
            });
        }
    }

    debug!(line, command = %command_type, "parsed command");
    Ok(Command {
        command_type,
        params,
        selector: selector.map(SelectorToken::into_spec),
    })
}

fn ensure_selector_values(selector: &SelectorToken, line: usize) -> Result<(), ParseError> {
    if selector.value.trim().is_empty() {
        return Err(ParseError::EmptySelector {
            line,
            strategy: selector.strategy.to_string(),
        });
    }
    for fallback in &selector.fallbacks {
        ensure_selector_values(fallback, line)?;
    }
    Ok(())
}
