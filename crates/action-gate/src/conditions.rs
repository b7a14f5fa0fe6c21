//! Expectation types for assertion commands

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use soultest_core_types::{Command, CommandType, SelectorSpec};

use crate::{
    errors::GateError,
    types::{Observation, Verdict},
};

/// One variant per assertion command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    Visible(SelectorSpec),
    Exists(SelectorSpec),
    Hidden(SelectorSpec),
    NotExists(SelectorSpec),
    Text {
        selector: SelectorSpec,
        expected: String,
        exact: bool,
    },
    Url(UrlMatch),
    Count {
        selector: SelectorSpec,
        condition: CountCondition,
    },
    Enabled(SelectorSpec),
    Disabled(SelectorSpec),
}

impl Expectation {
    /// Build from a parsed assertion command.
    pub fn from_command(command: &Command) -> Result<Self, GateError> {
        let name = command.command_type.name();
        let selector = || {
            command
                .selector
                .clone()
                .ok_or_else(|| GateError::invalid(name, "missing element selector"))
        };
        let param = |keys: &[&str]| {
            command
                .param_any(keys)
                .map(str::to_string)
                .ok_or_else(|| GateError::invalid(name, format!("missing {}", keys.join("|"))))
        };

        Ok(match command.command_type {
            CommandType::AssertVisible => Expectation::Visible(selector()?),
            CommandType::AssertExists => Expectation::Exists(selector()?),
            CommandType::AssertHidden => Expectation::Hidden(selector()?),
            CommandType::AssertNotExists => Expectation::NotExists(selector()?),
            CommandType::AssertEnabled => Expectation::Enabled(selector()?),
            CommandType::AssertDisabled => Expectation::Disabled(selector()?),
            CommandType::AssertText => Expectation::Text {
                selector: selector()?,
                expected: param(&["expected", "text"])?,
                exact: command.param("exact").is_some_and(is_truthy),
            },
            CommandType::AssertUrl => {
                let url = if let Some(pattern) = command.param("pattern") {
                    UrlMatch::matches(pattern)?
                } else {
                    UrlMatch::Equals(param(&["expected"])?)
                };
                Expectation::Url(url)
            }
            CommandType::AssertCount => Expectation::Count {
                selector: selector()?,
                condition: param(&["count", "expected"])?.parse()?,
            },
            other => return Err(GateError::NotAnAssertion(other.name().to_string())),
        })
    }

    /// Element the expectation is about, if any.
    pub fn selector(&self) -> Option<&SelectorSpec> {
        match self {
            Expectation::Visible(s)
            | Expectation::Exists(s)
            | Expectation::Hidden(s)
            | Expectation::NotExists(s)
            | Expectation::Enabled(s)
            | Expectation::Disabled(s) => Some(s),
            Expectation::Text { selector, .. } | Expectation::Count { selector, .. } => {
                Some(selector)
            }
            Expectation::Url(_) => None,
        }
    }

    pub fn evaluate(&self, observed: &Observation) -> Verdict {
        let subject = self
            .selector()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "page".to_string());
        let missing = "element not found".to_string();
        let present = observed.element_count > 0;

        match self {
            Expectation::Visible(_) => match (present, observed.visible) {
                (true, true) => Verdict::pass(format!("{subject} is visible")),
                (true, false) => Verdict::fail(&subject, "visible", "hidden"),
                (false, _) => Verdict::fail(&subject, "visible", missing),
            },
            Expectation::Exists(_) => {
                if present {
                    Verdict::pass(format!("{subject} exists"))
                } else {
                    Verdict::fail(&subject, "present", missing)
                }
            }
            Expectation::Hidden(_) => {
                if !present || !observed.visible {
                    Verdict::pass(format!("{subject} is hidden"))
                } else {
                    Verdict::fail(&subject, "hidden", "visible")
                }
            }
            Expectation::NotExists(_) => {
                if present {
                    Verdict::fail(
                        &subject,
                        "absent",
                        format!("{} matching elements", observed.element_count),
                    )
                } else {
                    Verdict::pass(format!("{subject} does not exist"))
                }
            }
            Expectation::Enabled(_) | Expectation::Disabled(_) => {
                let want_enabled = matches!(self, Expectation::Enabled(_));
                let wanted = if want_enabled { "enabled" } else { "disabled" };
                if !present {
                    Verdict::fail(&subject, wanted, missing)
                } else if observed.enabled == want_enabled {
                    Verdict::pass(format!("{subject} is {wanted}"))
                } else {
                    let actual = if observed.enabled { "enabled" } else { "disabled" };
                    Verdict::fail(&subject, wanted, actual)
                }
            }
            Expectation::Text {
                expected, exact, ..
            } => {
                if !present {
                    return Verdict::mismatch(&subject, format!("text {expected:?}"), missing);
                }
                let actual = observed.text.as_deref().unwrap_or_default().trim();
                let ok = if *exact {
                    actual == expected.trim()
                } else {
                    actual.contains(expected.trim())
                };
                if ok {
                    Verdict::pass(format!("{subject} has text {expected:?}"))
                } else {
                    Verdict::mismatch(
                        &subject,
                        format!("text {expected:?}"),
                        format!("text {actual:?}"),
                    )
                }
            }
            Expectation::Url(url) => match observed.url.as_deref() {
                Some(actual) if url.is_match(actual) => {
                    Verdict::pass(format!("url {actual} matches {url}"))
                }
                Some(actual) => Verdict::mismatch(&subject, url.to_string(), actual),
                None => Verdict::mismatch(&subject, url.to_string(), "no url"),
            },
            Expectation::Count { condition, .. } => {
                let count = observed.element_count;
                if condition.matches(count) {
                    Verdict::pass(format!("{subject} count {count} matches {condition}"))
                } else {
                    Verdict::mismatch(
                        &subject,
                        format!("count {condition}"),
                        format!("count {count}"),
                    )
                }
            }
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}

/// URL comparison for `assert_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlMatch {
    /// URL equals exact string
    Equals(String),

    /// URL matches regex pattern
    Matches(String),
}

impl UrlMatch {
    /// Regex match, validated up front.
    pub fn matches(pattern: &str) -> Result<Self, GateError> {
        Regex::new(pattern).map_err(|err| GateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;
        Ok(UrlMatch::Matches(pattern.to_string()))
    }

    pub fn is_match(&self, url: &str) -> bool {
        match self {
            UrlMatch::Equals(expected) => url.trim_end_matches('/') == expected.trim_end_matches('/'),
            UrlMatch::Matches(pattern) => Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for UrlMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlMatch::Equals(url) => write!(f, "url {url}"),
            UrlMatch::Matches(pattern) => write!(f, "url matching /{pattern}/"),
        }
    }
}

/// Count condition for numeric comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountCondition {
    /// Equal to value
    Equals(usize),

    /// Greater than value
    GreaterThan(usize),

    /// Less than value
    LessThan(usize),

    /// Between min and max (inclusive)
    Between(usize, usize),
}

impl CountCondition {
    /// Check if count matches condition
    pub fn matches(&self, count: usize) -> bool {
        match self {
            CountCondition::Equals(expected) => count == *expected,
            CountCondition::GreaterThan(threshold) => count > *threshold,
            CountCondition::LessThan(threshold) => count < *threshold,
            CountCondition::Between(min, max) => count >= *min && count <= *max,
        }
    }
}

impl fmt::Display for CountCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountCondition::Equals(n) => write!(f, "{n}"),
            CountCondition::GreaterThan(n) => write!(f, ">{n}"),
            CountCondition::LessThan(n) => write!(f, "<{n}"),
            CountCondition::Between(min, max) => write!(f, "{min}..{max}"),
        }
    }
}

/// Accepts `3`, `>2`, `<5` and `2..4`.
impl std::str::FromStr for CountCondition {
    type Err = GateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| GateError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };
        let number = |s: &str| {
            s.trim()
                .parse::<usize>()
                .map_err(|_| invalid("expected a non-negative integer"))
        };
        let value = raw.trim();
        if let Some(rest) = value.strip_prefix('>') {
            return Ok(CountCondition::GreaterThan(number(rest)?));
        }
        if let Some(rest) = value.strip_prefix('<') {
            return Ok(CountCondition::LessThan(number(rest)?));
        }
        if let Some((min, max)) = value.split_once("..") {
            let (min, max) = (number(min)?, number(max)?);
            if min > max {
                return Err(invalid("range start exceeds end"));
            }
            return Ok(CountCondition::Between(min, max));
        }
        Ok(CountCondition::Equals(number(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seen(count: usize) -> Observation {
        Observation {
            element_count: count,
            visible: count > 0,
            enabled: true,
            text: None,
            url: None,
        }
    }

    #[test]
    fn test_count_condition() {
        assert!(CountCondition::Equals(5).matches(5));
        assert!(!CountCondition::Equals(5).matches(4));
        assert!(CountCondition::GreaterThan(3).matches(4));
        assert!(!CountCondition::LessThan(10).matches(10));
        assert!(CountCondition::Between(5, 10).matches(10));
        assert!(!CountCondition::Between(5, 10).matches(11));
    }

    #[test]
    fn count_condition_parses_shorthand() {
        assert_eq!("3".parse::<CountCondition>().unwrap(), CountCondition::Equals(3));
        assert_eq!(">2".parse::<CountCondition>().unwrap(), CountCondition::GreaterThan(2));
        assert_eq!("< 5".parse::<CountCondition>().unwrap(), CountCondition::LessThan(5));
        assert_eq!(
            "2..4".parse::<CountCondition>().unwrap(),
            CountCondition::Between(2, 4)
        );
        assert!("4..2".parse::<CountCondition>().is_err());
        assert!("many".parse::<CountCondition>().is_err());
    }

    #[test]
    fn builds_from_assertion_commands() {
        let command = Command::new(CommandType::AssertText)
            .with_selector(SelectorSpec::css("h1"))
            .with_param("expected", "Welcome")
            .with_param("exact", "true");
        assert_eq!(
            Expectation::from_command(&command).unwrap(),
            Expectation::Text {
                selector: SelectorSpec::css("h1"),
                expected: "Welcome".into(),
                exact: true
            }
        );

        let url = Command::new(CommandType::AssertUrl).with_param("pattern", "/dash(board)?$");
        assert!(matches!(
            Expectation::from_command(&url).unwrap(),
            Expectation::Url(UrlMatch::Matches(_))
        ));

        let bad = Command::new(CommandType::AssertUrl).with_param("pattern", "(");
        assert!(matches!(
            Expectation::from_command(&bad),
            Err(GateError::InvalidPattern { .. })
        ));

        let click = Command::new(CommandType::Click).with_selector(SelectorSpec::css("a"));
        assert_eq!(
            Expectation::from_command(&click),
            Err(GateError::NotAnAssertion("click".into()))
        );
    }

    #[test]
    fn missing_element_reads_as_not_found() {
        let verdict = Expectation::Visible(SelectorSpec::css(".dashboard")).evaluate(&seen(0));
        assert!(!verdict.passed);
        assert_eq!(
            verdict.message,
            "expected css=.dashboard to be visible but got element not found"
        );
    }

    #[test]
    fn text_mismatch_reports_both_sides() {
        let expectation = Expectation::Text {
            selector: SelectorSpec::css("h1"),
            expected: "Welcome".into(),
            exact: false,
        };
        let mut observed = seen(1);
        observed.text = Some("  Hello, Welcome back ".into());
        assert!(expectation.evaluate(&observed).passed);

        observed.text = Some("Goodbye".into());
        let verdict = expectation.evaluate(&observed);
        assert!(!verdict.passed);
        assert_eq!(verdict.expected, "text \"Welcome\"");
        assert_eq!(verdict.actual, "text \"Goodbye\"");
        assert_eq!(
            verdict.message,
            "expected css=h1 to have text \"Welcome\" but got text \"Goodbye\""
        );
    }

    #[test]
    fn hidden_and_absent() {
        let hidden = Expectation::Hidden(SelectorSpec::css(".toast"));
        assert!(hidden.evaluate(&seen(0)).passed);
        let mut invisible = seen(1);
        invisible.visible = false;
        assert!(hidden.evaluate(&invisible).passed);
        assert!(!hidden.evaluate(&seen(1)).passed);

        let absent = Expectation::NotExists(SelectorSpec::css(".error"));
        assert!(absent.evaluate(&seen(0)).passed);
        assert_eq!(absent.evaluate(&seen(2)).actual, "2 matching elements");
    }

    #[test]
    fn url_equality_ignores_trailing_slash() {
        let expectation = Expectation::Url(UrlMatch::Equals("https://x.test/home".into()));
        let mut observed = seen(0);
        observed.url = Some("https://x.test/home/".into());
        assert!(expectation.evaluate(&observed).passed);
        observed.url = Some("https://x.test/login".into());
        assert!(!expectation.evaluate(&observed).passed);
    }
}
