//! Gate validator: observes the page and evaluates expectations

use crate::{conditions::Expectation, errors::GateError, types::*};
use action_locator::{ElementResolver, StaticPage};
use async_trait::async_trait;
use soultest_core_types::{Command, CommandExecutor, CommandOutcome};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Gathers the page state an expectation needs.
#[async_trait]
pub trait PageProbe: Send + Sync {
    async fn observe(&self, expectation: &Expectation) -> Result<Observation, GateError>;
}

/// Current page URL source.
#[async_trait]
pub trait UrlSource: Send + Sync {
    async fn current_url(&self) -> Option<String>;
}

#[async_trait]
impl UrlSource for StaticPage {
    async fn current_url(&self) -> Option<String> {
        self.url()
    }
}

/// Probe backed by the element resolver.
pub struct LocatorProbe {
    resolver: Arc<dyn ElementResolver>,
    urls: Arc<dyn UrlSource>,
}

impl LocatorProbe {
    pub fn new(resolver: Arc<dyn ElementResolver>, urls: Arc<dyn UrlSource>) -> Self {
        Self { resolver, urls }
    }
}

#[async_trait]
impl PageProbe for LocatorProbe {
    async fn observe(&self, expectation: &Expectation) -> Result<Observation, GateError> {
        let url = self.urls.current_url().await;
        let Some(selector) = expectation.selector() else {
            return Ok(Observation {
                url,
                ..Observation::default()
            });
        };

        let found = self
            .resolver
            .find_all(selector)
            .await
            .map_err(|err| GateError::ProbeFailed(err.to_string()))?;
        let first = found.first();
        Ok(Observation {
            element_count: found.len(),
            visible: first.is_some_and(|e| e.visible),
            enabled: first.is_some_and(|e| e.enabled),
            text: first.and_then(|e| {
                e.text
                    .clone()
                    .or_else(|| e.attribute("value").map(str::to_string))
            }),
            url,
        })
    }
}

/// Executor that checks assertion commands locally and delegates the rest.
pub struct GatedExecutor {
    inner: Arc<dyn CommandExecutor>,
    probe: Arc<dyn PageProbe>,
    config: GateConfig,
}

impl GatedExecutor {
    pub fn new(inner: Arc<dyn CommandExecutor>, probe: Arc<dyn PageProbe>) -> Self {
        Self::with_config(inner, probe, GateConfig::default())
    }

    pub fn with_config(
        inner: Arc<dyn CommandExecutor>,
        probe: Arc<dyn PageProbe>,
        config: GateConfig,
    ) -> Self {
        Self {
            inner,
            probe,
            config,
        }
    }

    /// Re-observe until the expectation holds or the timeout elapses.
    pub async fn check(&self, expectation: &Expectation) -> Result<Verdict, GateError> {
        let start = Instant::now();
        loop {
            let observed = self.probe.observe(expectation).await?;
            let verdict = expectation.evaluate(&observed);
            if verdict.passed || start.elapsed() >= self.config.timeout {
                return Ok(verdict);
            }
            debug!("Expectation not met yet: {}", verdict.message);
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl CommandExecutor for GatedExecutor {
    async fn execute(&self, command: &Command) -> CommandOutcome {
        if !command.command_type.is_assertion() {
            return self.inner.execute(command).await;
        }

        let expectation = match Expectation::from_command(command) {
            Ok(expectation) => expectation,
            Err(err) => return CommandOutcome::failed(err.to_string()),
        };
        match self.check(&expectation).await {
            Ok(verdict) if verdict.passed => {
                info!("Assertion passed: {}", verdict.message);
                CommandOutcome::ok_with_output(verdict.message)
            }
            Ok(verdict) => {
                warn!("Assertion failed: {}", verdict.message);
                CommandOutcome::failed(format!("{}: {}", command.command_type, verdict.message))
            }
            Err(err) => CommandOutcome::failed(err.to_string()),
        }
    }
}
