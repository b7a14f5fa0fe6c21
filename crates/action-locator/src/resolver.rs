//! Element resolver with fallback chain orchestration

use crate::{errors::LocatorError, lookup::*, strategies::*, types::*};
use async_trait::async_trait;
use soultest_core_types::SelectorSpec;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Element resolver trait
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Resolve one element, walking the fallback chain
    async fn resolve(&self, selector: &SelectorSpec) -> Result<ResolutionResult, LocatorError>;

    /// Every current match of the first chain entry that matches anything, without waiting
    async fn find_all(&self, selector: &SelectorSpec) -> Result<Vec<ElementHandle>, LocatorError>;
}

/// Default element resolver implementation
pub struct DefaultElementResolver {
    lookup: Arc<dyn ElementLookup>,
    config: LocatorConfig,
}

impl DefaultElementResolver {
    /// Create a new resolver over a lookup backend
    pub fn new(lookup: Arc<dyn ElementLookup>) -> Self {
        Self::with_config(lookup, LocatorConfig::default())
    }

    pub fn with_config(lookup: Arc<dyn ElementLookup>, config: LocatorConfig) -> Self {
        Self { lookup, config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Run one chain entry under the wait bound.
    async fn attempt(&self, entry: &SelectorSpec) -> (AttemptOutcome, Option<ElementHandle>) {
        let strategy = strategy_for(entry.strategy);
        let query = match query_for(entry) {
            Ok(query) => query,
            Err(err) => return (AttemptOutcome::Failed(err.to_string()), None),
        };
        debug!("Trying strategy {} with {}", strategy.name(), query);

        let found = if self.config.attempt_timeout.is_zero() {
            match self.lookup.find(&query).await {
                Ok(found) if found.is_empty() => return (AttemptOutcome::NotFound, None),
                Ok(found) => found,
                Err(err) => return (AttemptOutcome::Failed(err.to_string()), None),
            }
        } else {
            let poll = async {
                loop {
                    match self.lookup.find(&query).await {
                        Ok(found) if !found.is_empty() => return Ok(found),
                        Ok(_) => tokio::time::sleep(self.config.poll_interval).await,
                        Err(err) => return Err(err),
                    }
                }
            };
            match tokio::time::timeout(self.config.attempt_timeout, poll).await {
                Ok(Ok(found)) => found,
                Ok(Err(err)) => return (AttemptOutcome::Failed(err.to_string()), None),
                Err(_) => return (AttemptOutcome::TimedOut, None),
            }
        };

        if strategy.requires_unique_match() && found.len() > 1 {
            warn!(
                "Ambiguous match: {} elements for {}={}",
                found.len(),
                strategy.name(),
                entry.source_value()
            );
            return (AttemptOutcome::Ambiguous(found.len()), None);
        }
        (AttemptOutcome::Matched, found.into_iter().next())
    }
}

#[async_trait]
impl ElementResolver for DefaultElementResolver {
    async fn resolve(&self, selector: &SelectorSpec) -> Result<ResolutionResult, LocatorError> {
        info!("Resolving element: {}", selector);

        let mut attempts = Vec::new();
        for (chain_index, entry) in selector.chain().into_iter().enumerate() {
            let strategy = entry.strategy;
            let (outcome, element) = self.attempt(entry).await;
            attempts.push(Attempt::new(strategy, entry.source_value(), outcome.clone()));

            if let Some(element) = element {
                info!(
                    "Resolved element using {} strategy: {} (chain index {})",
                    strategy, element.id, chain_index
                );
                return Ok(ResolutionResult {
                    element,
                    strategy,
                    value: entry.value.clone(),
                    chain_index,
                    attempts,
                });
            }
            warn!(
                "Strategy {}={} gave no usable match: {}",
                strategy,
                entry.source_value(),
                outcome
            );
        }

        // Chain exhausted
        let ambiguous: Vec<usize> = attempts
            .iter()
            .filter_map(|a| match a.outcome {
                AttemptOutcome::Ambiguous(count) => Some(count),
                _ => None,
            })
            .collect();
        if !ambiguous.is_empty() && ambiguous.len() == attempts.len() {
            return Err(LocatorError::AmbiguousMatch {
                selector: selector.to_string(),
                count: ambiguous.into_iter().max().unwrap_or_default(),
            });
        }
        Err(LocatorError::ElementNotFound { tried: attempts })
    }

    async fn find_all(&self, selector: &SelectorSpec) -> Result<Vec<ElementHandle>, LocatorError> {
        let mut last_error = None;
        for entry in selector.chain() {
            let query = match query_for(entry) {
                Ok(query) => query,
                Err(err) => {
                    debug!("Skipping {}={}: {}", entry.strategy, entry.value, err);
                    last_error = Some(err);
                    continue;
                }
            };
            match self.lookup.find(&query).await {
                Ok(found) if !found.is_empty() => return Ok(found),
                Ok(_) => {}
                Err(err) => {
                    debug!("Lookup for {} failed: {}", query, err);
                    last_error = Some(err);
                }
            }
        }
        match last_error {
            // Nothing in the chain could even be queried
            Some(err) if selector.chain().len() == 1 => Err(err),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageElement, StaticPage};
    use soultest_core_types::SelectorStrategy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fast() -> LocatorConfig {
        LocatorConfig {
            attempt_timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(10),
        }
    }

    fn page() -> Arc<StaticPage> {
        Arc::new(StaticPage::with_elements([
            PageElement::new("submit", "button")
                .css("button[type=submit]")
                .text("Submit"),
            PageElement::new("cancel", "button").css("button.cancel").text("Cancel"),
            PageElement::new("go-1", "a").text("Go"),
            PageElement::new("go-2", "a").text("Go"),
        ]))
    }

    #[tokio::test(start_paused = true)]
    async fn primary_match_wins() {
        let resolver = DefaultElementResolver::with_config(page(), fast());
        let spec = SelectorSpec::css("button.cancel").with_fallback(SelectorSpec::text("Submit"));
        let result = resolver.resolve(&spec).await.unwrap();
        assert_eq!(result.element.id, "cancel");
        assert!(!result.from_fallback());
        assert_eq!(result.attempts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_in_declared_order() {
        let resolver = DefaultElementResolver::with_config(page(), fast());
        let spec = SelectorSpec::css("button.submit")
            .with_fallback(SelectorSpec::css("button[type=submit]"))
            .with_fallback(SelectorSpec::text("Cancel"));
        let result = resolver.resolve(&spec).await.unwrap();
        assert_eq!(result.element.id, "submit");
        assert_eq!(result.chain_index, 1);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn ambiguous_text_moves_to_next_fallback() {
        let resolver = DefaultElementResolver::with_config(page(), fast());
        let spec = SelectorSpec::text("Go").with_fallback(SelectorSpec::text("Submit"));
        let result = resolver.resolve(&spec).await.unwrap();
        assert_eq!(result.element.id, "submit");
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::Ambiguous(2));

        let only_ambiguous = SelectorSpec::text("Go");
        let err = resolver.resolve(&only_ambiguous).await.unwrap_err();
        assert_eq!(
            err,
            LocatorError::AmbiguousMatch {
                selector: "text=Go".into(),
                count: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exact_text_ignores_longer_labels() {
        let page = Arc::new(StaticPage::with_elements([
            PageElement::new("login", "button").text("Login"),
            PageElement::new("help", "a").text("Login help"),
        ]));
        let resolver = DefaultElementResolver::with_config(page, fast());

        let result = resolver.resolve(&SelectorSpec::exact_text("Login")).await.unwrap();
        assert_eq!(result.element.id, "login");

        let err = resolver.resolve(&SelectorSpec::text("Login")).await.unwrap_err();
        assert_eq!(
            err,
            LocatorError::AmbiguousMatch {
                selector: "text=Login".into(),
                count: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_names_every_attempt() {
        let resolver = DefaultElementResolver::with_config(page(), fast());
        let spec = SelectorSpec::css("#missing")
            .with_fallback(SelectorSpec::new(SelectorStrategy::Xpath, "no-slash"))
            .with_fallback(SelectorSpec::text("Go"));
        let err = resolver.resolve(&spec).await.unwrap_err();
        let LocatorError::ElementNotFound { tried } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(tried.len(), 3);
        let message = err.to_string();
        assert!(message.contains("css=#missing (timed out)"));
        assert!(message.contains("xpath=no-slash (failed: Invalid selector"));
        assert!(message.contains("text=Go (ambiguous, 2 matches)"));
    }

    struct LateLookup {
        calls: AtomicUsize,
        appears_after: usize,
    }

    #[async_trait]
    impl ElementLookup for LateLookup {
        async fn find(&self, _query: &ElementQuery) -> Result<Vec<ElementHandle>, LocatorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call > self.appears_after {
                Ok(vec![ElementHandle::new("late")])
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_late_elements_within_bound() {
        let lookup = Arc::new(LateLookup {
            calls: AtomicUsize::new(0),
            appears_after: 5,
        });
        let resolver = DefaultElementResolver::with_config(lookup.clone(), fast());
        let result = resolver.resolve(&SelectorSpec::css(".spinner-done")).await.unwrap();
        assert_eq!(result.element.id, "late");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn zero_timeout_checks_once() {
        let config = LocatorConfig {
            attempt_timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(10),
        };
        let resolver = DefaultElementResolver::with_config(page(), config);
        let err = resolver.resolve(&SelectorSpec::css("#nope")).await.unwrap_err();
        assert!(err.to_string().contains("css=#nope (not found)"));
    }

    #[tokio::test]
    async fn find_all_returns_first_non_empty_entry() {
        let resolver = DefaultElementResolver::new(page());
        let spec = SelectorSpec::css("#none").with_fallback(SelectorSpec::text("Go"));
        let found = resolver.find_all(&spec).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(resolver
            .find_all(&SelectorSpec::css("#none"))
            .await
            .unwrap()
            .is_empty());
        assert!(resolver
            .find_all(&SelectorSpec::css(" "))
            .await
            .is_err());
    }
}
