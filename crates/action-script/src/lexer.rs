//! Line lexer
//!
//! Grammar of one line:
//!
//! ```text
//! <command> [<strategy>=<value> [fallback <strategy>=<value>]...] [<key>=<value> ...]
//! ```
//!
//! A value may be single- or double-quoted when the quote opens the word or
//! directly follows the `=`; inside such quotes a backslash escapes the next
//! character and the quotes themselves are dropped. A quote anywhere else is
//! part of the value: `xpath=//a[text()='Sign in']` keeps its quotes, and the
//! span up to the matching quote may contain spaces. A quoted `text` selector
//! value is an exact match. A word starting with `#` begins a trailing comment.

use soultest_core_types::{CommandType, SelectorSpec, SelectorStrategy};
use tracing::trace;

use crate::errors::LexError;

/// Alias table applied at the lexer boundary. Aliases never travel further.
const COMMAND_ALIASES: &[(&str, CommandType)] = &[
    ("goto", CommandType::Navigate),
    ("open", CommandType::Navigate),
    ("visit", CommandType::Navigate),
    ("go_back", CommandType::GoBack),
    ("back", CommandType::GoBack),
    ("go_forward", CommandType::GoForward),
    ("forward", CommandType::GoForward),
    ("refresh", CommandType::Reload),
    ("tap", CommandType::Click),
    ("type_text", CommandType::Type),
    ("input", CommandType::Fill),
    ("drag_drop", CommandType::DragDrop),
    ("drag_and_drop", CommandType::DragDrop),
    ("select_option", CommandType::SelectOption),
    ("upload_file", CommandType::UploadFile),
    ("upload", CommandType::UploadFile),
    ("sleep", CommandType::Wait),
    ("pause", CommandType::Wait),
    ("wait_for_selector", CommandType::WaitForSelector),
    ("wait_for_element", CommandType::WaitForSelector),
    ("wait_for_url", CommandType::WaitForUrl),
    ("wait_for_load_state", CommandType::WaitForLoadState),
    ("assert_visible", CommandType::AssertVisible),
    ("assert_exists", CommandType::AssertExists),
    ("assert_hidden", CommandType::AssertHidden),
    ("assert_not_exists", CommandType::AssertNotExists),
    ("assert_text", CommandType::AssertText),
    ("assert_url", CommandType::AssertUrl),
    ("assert_count", CommandType::AssertCount),
    ("assert_enabled", CommandType::AssertEnabled),
    ("assert_disabled", CommandType::AssertDisabled),
    ("get_attribute", CommandType::GetAttribute),
    ("get_text", CommandType::GetText),
    ("set_variable", CommandType::SetVariable),
    ("set", CommandType::SetVariable),
    ("get_variable", CommandType::GetVariable),
];

/// Selector token with any `fallback` clauses attached in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorToken {
    pub strategy: SelectorStrategy,
    pub value: String,
    /// Quoted `text` value
    pub exact: bool,
    pub fallbacks: Vec<SelectorToken>,
}

impl SelectorToken {
    pub fn into_spec(self) -> SelectorSpec {
        SelectorSpec {
            strategy: self.strategy,
            value: self.value,
            exact: self.exact,
            fallbacks: self
                .fallbacks
                .into_iter()
                .map(SelectorToken::into_spec)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Canonical command name
    Command(String),
    Selector(SelectorToken),
    Param { key: String, value: String },
}

/// Resolve a raw command word to its canonical name. Unknown words pass through unchanged.
pub fn canonical_command_name(raw: &str) -> String {
    if CommandType::from_name(raw).is_some() {
        return raw.to_string();
    }
    let lowered = raw.to_ascii_lowercase();
    COMMAND_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, kind)| kind.name().to_string())
        .or_else(|| {
            CommandType::ALL
                .iter()
                .find(|kind| kind.name().eq_ignore_ascii_case(raw))
                .map(|kind| kind.name().to_string())
        })
        .unwrap_or_else(|| raw.to_string())
}

/// Split one source line into tokens. Blank and comment lines yield nothing.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(Vec::new());
    }

    let mut words = split_words(trimmed)?.into_iter().peekable();
    let mut tokens = Vec::new();
    let mut accepts_selector = true;
    let mut selector_seen = false;

    if let Some(first) = words.next_if(|word| word.eq.is_none() && !word.quoted) {
        let name = canonical_command_name(&first.text);
        accepts_selector = CommandType::from_name(&name)
            .map(CommandType::accepts_selector)
            .unwrap_or(true);
        tokens.push(Token::Command(name));
    }

    while let Some(word) = words.next() {
        if word.is_keyword("fallback") {
            if !matches!(tokens.last(), Some(Token::Selector(_))) {
                return Err(LexError::DanglingFallback);
            }
            let next = words
                .next()
                .ok_or_else(|| LexError::InvalidFallback("end of line".to_string()))?;
            let fallback = next
                .as_selector()
                .ok_or_else(|| LexError::InvalidFallback(format!("'{}'", next.text)))?;
            if let Some(Token::Selector(primary)) = tokens.last_mut() {
                primary.fallbacks.push(fallback);
            }
            continue;
        }

        let (key, value) = word.split()?;
        if accepts_selector && !selector_seen {
            if let Some(selector) = word.as_selector() {
                selector_seen = true;
                tokens.push(Token::Selector(selector));
                continue;
            }
        }
        tokens.push(Token::Param {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    trace!(count = tokens.len(), "tokenized line");
    Ok(tokens)
}

#[derive(Debug)]
struct RawWord {
    text: String,
    /// Byte offset of the first unquoted `=`.
    eq: Option<usize>,
    /// The whole word opened with a quote.
    quoted: bool,
    /// The value after `=` opened with a quote.
    value_quoted: bool,
}

impl RawWord {
    fn is_keyword(&self, keyword: &str) -> bool {
        self.eq.is_none() && !self.quoted && self.text == keyword
    }

    fn split(&self) -> Result<(&str, &str), LexError> {
        match self.eq {
            None => Err(LexError::MalformedToken(self.text.clone())),
            Some(0) => Err(LexError::EmptyKey(self.text.clone())),
            Some(idx) => Ok((&self.text[..idx], &self.text[idx + 1..])),
        }
    }

    fn as_selector(&self) -> Option<SelectorToken> {
        let (key, value) = self.split().ok()?;
        let strategy = SelectorStrategy::from_keyword(key)?;
        Some(SelectorToken {
            strategy,
            value: value.to_string(),
            exact: strategy == SelectorStrategy::Text && self.value_quoted,
            fallbacks: Vec::new(),
        })
    }

    /// A quote here opens a quoted value rather than being literal.
    fn opens_quote(&self) -> bool {
        match self.eq {
            None => self.text.is_empty(),
            Some(idx) => idx + 1 == self.text.len() && !self.value_quoted,
        }
    }
}

fn split_words(line: &str) -> Result<Vec<RawWord>, LexError> {
    let chars: Vec<char> = line.chars().collect();
    let mut words = Vec::new();
    let mut current: Option<RawWord> = None;
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch.is_whitespace() {
            if let Some(word) = current.take() {
                words.push(word);
            }
            idx += 1;
            continue;
        }
        if current.is_none() && ch == '#' {
            break;
        }

        let word = current.get_or_insert_with(|| RawWord {
            text: String::new(),
            eq: None,
            quoted: false,
            value_quoted: false,
        });

        match ch {
            '"' | '\'' if word.opens_quote() => {
                if word.eq.is_some() {
                    word.value_quoted = true;
                } else {
                    word.quoted = true;
                }
                let close = closing_quote(&chars, idx).ok_or(LexError::UnterminatedQuote {
                    quote: ch,
                    column: idx + 1,
                })?;
                let mut inner = chars[idx + 1..close].iter();
                while let Some(&c) = inner.next() {
                    match c {
                        '\\' => word.text.extend(inner.next()),
                        _ => word.text.push(c),
                    }
                }
                idx = close;
            }
            '"' | '\'' => match closing_quote(&chars, idx) {
                // Verbatim span, quotes included
                Some(close) => {
                    word.text.extend(&chars[idx..=close]);
                    idx = close;
                }
                None => word.text.push(ch),
            },
            '=' if word.eq.is_none() && !word.quoted => {
                word.eq = Some(word.text.len());
                word.text.push('=');
            }
            _ => word.text.push(ch),
        }
        idx += 1;
    }

    if let Some(word) = current {
        words.push(word);
    }
    Ok(words)
}

/// Index of the quote closing the one at `open`, skipping backslash escapes.
fn closing_quote(chars: &[char], open: usize) -> Option<usize> {
    let quote = chars[open];
    let mut idx = open + 1;
    while idx < chars.len() {
        match chars[idx] {
            '\\' => idx += 2,
            c if c == quote => return Some(idx),
            _ => idx += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_and_blank_lines_yield_nothing() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("    \t ").unwrap().is_empty());
        assert!(tokenize("# navigate url=x").unwrap().is_empty());
        assert!(tokenize("   # indented comment").unwrap().is_empty());
    }

    #[test]
    fn splits_command_selector_and_params() {
        let tokens = tokenize("fill   css=#email    text=\"jane@example.com\"").unwrap();
        assert_eq!(tokens[0], Token::Command("fill".into()));
        assert_eq!(
            tokens[1],
            Token::Selector(SelectorToken {
                strategy: SelectorStrategy::Css,
                value: "#email".into(),
                exact: false,
                fallbacks: vec![],
            })
        );
        assert_eq!(
            tokens[2],
            Token::Param {
                key: "text".into(),
                value: "jane@example.com".into()
            }
        );
    }

    #[test]
    fn quoted_values_keep_spaces_and_escapes() {
        let tokens = tokenize(r#"assert_text css=h1 expected='It\'s "done" now'"#).unwrap();
        assert_eq!(
            tokens[2],
            Token::Param {
                key: "expected".into(),
                value: "It's \"done\" now".into()
            }
        );
    }

    #[test]
    fn fallback_attaches_to_preceding_selector() {
        let tokens =
            tokenize("click css=button.submit fallback css=button[type=submit] fallback text=Go")
                .unwrap();
        assert_eq!(tokens.len(), 2);
        let Token::Selector(selector) = &tokens[1] else {
            panic!("expected selector token");
        };
        assert_eq!(selector.value, "button.submit");
        assert_eq!(selector.fallbacks.len(), 2);
        assert_eq!(selector.fallbacks[0].value, "button[type=submit]");
        assert_eq!(selector.fallbacks[1].strategy, SelectorStrategy::Text);
    }

    #[test]
    fn quotes_inside_selector_values_are_literal() {
        let tokens = tokenize(r#"click xpath=//button[text()='Sign in'] fallback css=a[title="Hello World"]"#)
            .unwrap();
        assert_eq!(tokens.len(), 2);
        let Token::Selector(selector) = &tokens[1] else {
            panic!("expected selector token");
        };
        assert_eq!(selector.strategy, SelectorStrategy::Xpath);
        assert_eq!(selector.value, "//button[text()='Sign in']");
        assert_eq!(selector.fallbacks[0].value, r#"a[title="Hello World"]"#);
        assert!(!selector.exact);

        // An unmatched apostrophe stays a plain character
        let tokens = tokenize("assertText css=h1 expected=It's").unwrap();
        assert_eq!(
            tokens[2],
            Token::Param {
                key: "expected".into(),
                value: "It's".into()
            }
        );
    }

    #[test]
    fn quoted_text_selectors_are_exact() {
        let tokens = tokenize(r#"click text="Login" fallback text=Login fallback label="Email""#).unwrap();
        let Token::Selector(selector) = &tokens[1] else {
            panic!("expected selector token");
        };
        assert_eq!(selector.value, "Login");
        assert!(selector.exact);
        assert!(!selector.fallbacks[0].exact);
        assert!(!selector.fallbacks[1].exact);
        assert_eq!(selector.fallbacks[1].value, "Email");
    }

    #[test]
    fn aliases_normalize_to_canonical_names() {
        let cases = [
            ("assert_visible", "assertVisible"),
            ("assert_not_exists", "assertNotExists"),
            ("go_back", "goBack"),
            ("goto", "navigate"),
            ("drag_and_drop", "dragDrop"),
            ("ASSERTVISIBLE", "assertVisible"),
            ("assertVisible", "assertVisible"),
            ("teleport", "teleport"),
        ];
        for (raw, canonical) in cases {
            assert_eq!(canonical_command_name(raw), canonical, "alias {raw}");
        }
    }

    #[test]
    fn strategy_keys_after_selector_are_params() {
        let tokens = tokenize("type css=#q text=hello").unwrap();
        assert!(matches!(&tokens[1], Token::Selector(s) if s.strategy == SelectorStrategy::Css));
        assert_eq!(
            tokens[2],
            Token::Param {
                key: "text".into(),
                value: "hello".into()
            }
        );
    }

    #[test]
    fn selectorless_commands_never_produce_selector_tokens() {
        let tokens = tokenize("set_variable name=greeting value=hi text=unused").unwrap();
        assert_eq!(tokens[0], Token::Command("setVariable".into()));
        assert!(tokens.iter().all(|t| !matches!(t, Token::Selector(_))));
    }

    #[test]
    fn trailing_comment_is_ignored() {
        let tokens = tokenize("reload # refresh the page").unwrap();
        assert_eq!(tokens, vec![Token::Command("reload".into())]);
    }

    #[test]
    fn lexing_errors() {
        assert_eq!(
            tokenize("click text=\"Login").unwrap_err(),
            LexError::UnterminatedQuote {
                quote: '"',
                column: 12
            }
        );
        assert_eq!(
            tokenize("navigate fallback css=a").unwrap_err(),
            LexError::DanglingFallback
        );
        assert!(matches!(
            tokenize("click css=a fallback nope").unwrap_err(),
            LexError::InvalidFallback(_)
        ));
        assert_eq!(
            tokenize("press Enter").unwrap_err(),
            LexError::MalformedToken("Enter".into())
        );
        assert!(matches!(
            tokenize("click =x").unwrap_err(),
            LexError::EmptyKey(_)
        ));
    }
}
