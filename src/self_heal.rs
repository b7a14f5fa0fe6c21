//! Self-healing loop: execute, analyse the failure, ask for a repair, retry.

use std::sync::Arc;
use std::time::Duration;

use action_flow::{ExecutionReport, FlowError, Orchestrator, Subtask};
use action_script::parse_content;
use agent_core::GenerationError;
use serde::Serialize;
use soultest_core_types::{Command, CommandExecutor, PageSnapshotProvider};
use soultest_state_center::ExecutionContextManager;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::failure::{CaptureOptions, FailureAnalyzer, FailureContext};
use crate::replan::RefinementEngine;

#[derive(Debug, Error)]
pub enum HealError {
    #[error("max_attempts must be at least 1")]
    NoAttempts,
    #[error("repair generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// Outcome of a healing run. Failures are reported here, never as errors.
#[derive(Debug, Clone, Serialize)]
pub struct HealingResult {
    pub success: bool,
    pub attempts: u32,
    /// Script that passed, or the last candidate tried
    pub final_content: String,
    pub total_duration: Duration,
    pub failure_history: Vec<FailureContext>,
    /// Why the loop stopped before using every attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_early: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct HealingOptions {
    pub max_attempts: u32,
    pub capture: CaptureOptions,
}

impl Default for HealingOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            capture: CaptureOptions {
                capture_html: true,
                capture_screenshot: false,
            },
        }
    }
}

pub struct SelfHealingOrchestrator {
    executor: Arc<dyn CommandExecutor>,
    snapshots: Option<Arc<dyn PageSnapshotProvider>>,
    refiner: RefinementEngine,
    analyzer: FailureAnalyzer,
    context: Arc<ExecutionContextManager>,
    max_attempts: u32,
}

impl SelfHealingOrchestrator {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        refiner: RefinementEngine,
        options: HealingOptions,
    ) -> Result<Self, HealError> {
        if options.max_attempts == 0 {
            return Err(HealError::NoAttempts);
        }
        Ok(Self {
            executor,
            snapshots: None,
            refiner,
            analyzer: FailureAnalyzer::new(options.capture),
            context: Arc::new(ExecutionContextManager::default()),
            max_attempts: options.max_attempts,
        })
    }

    /// Page snapshots make failures repairable; without them the loop stops
    /// after the first failed execution.
    pub fn with_snapshots(mut self, snapshots: Arc<dyn PageSnapshotProvider>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Base context every attempt starts from.
    pub fn with_context(mut self, context: Arc<ExecutionContextManager>) -> Self {
        self.context = context;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `content`, repairing it on failure, for at most `max_attempts` executions.
    pub async fn refine_test(&self, test_name: &str, content: &str) -> HealingResult {
        self.refine_test_with(test_name, content, self.executor.clone())
            .await
    }

    /// [`refine_test`](Self::refine_test) against a caller-supplied executor
    /// instead of the one given at construction.
    pub async fn refine_test_with(
        &self,
        test_name: &str,
        content: &str,
        executor: Arc<dyn CommandExecutor>,
    ) -> HealingResult {
        let start = Instant::now();
        let mut current = content.to_string();
        let mut history: Vec<FailureContext> = Vec::new();

        for attempt in 1..=self.max_attempts {
            info!("Healing {}: attempt {}/{}", test_name, attempt, self.max_attempts);

            let failure = match parse_content(&current) {
                Err(err) => {
                    warn!("Candidate for {} does not parse: {}", test_name, err);
                    self.analyzer.parse_failure(&err.to_string(), attempt)
                }
                Ok(script) => {
                    let report = match self
                        .execute(&executor, test_name, attempt, script.to_vec())
                        .await
                    {
                        Ok(report) => report,
                        Err(err) => {
                            return Self::finish(false, attempt, current, start, history, Some(err))
                        }
                    };
                    if report.success {
                        info!("{} passed on attempt {}", test_name, attempt);
                        return Self::finish(true, attempt, current, start, history, None);
                    }
                    let error = report.error.unwrap_or_else(|| "unknown error".to_string());
                    let Some(snapshots) = &self.snapshots else {
                        warn!("{} failed and no page snapshot is available: {}", test_name, error);
                        return Self::finish(false, attempt, current, start, history, None);
                    };
                    self.analyzer
                        .analyze(report.failed_command.as_ref(), &error, snapshots.as_ref(), attempt)
                        .await
                }
            };
            history.push(failure);

            if attempt < self.max_attempts {
                let (latest, previous) = match history.split_last() {
                    Some(split) => split,
                    None => break,
                };
                match self.refiner.refine(test_name, &current, latest, previous).await {
                    Ok(candidate) => current = candidate,
                    Err(err) => {
                        warn!("Repair for {} failed: {}", test_name, err);
                        return Self::finish(false, attempt, current, start, history, Some(err.into()));
                    }
                }
            }
        }

        warn!("{} still failing after {} attempts", test_name, self.max_attempts);
        Self::finish(false, self.max_attempts, current, start, history, None)
    }

    async fn execute(
        &self,
        executor: &Arc<dyn CommandExecutor>,
        test_name: &str,
        attempt: u32,
        commands: Vec<Command>,
    ) -> Result<ExecutionReport, HealError> {
        let orchestrator =
            Orchestrator::with_context(executor.clone(), Arc::new(self.context.fork()));
        let id = format!("{test_name}#{attempt}");
        orchestrator.register_subtask(Subtask::new(id.clone(), test_name, commands))?;
        Ok(orchestrator.execute_subtask(&id).await?)
    }

    fn finish(
        success: bool,
        attempts: u32,
        final_content: String,
        start: Instant,
        failure_history: Vec<FailureContext>,
        stopped_early: Option<HealError>,
    ) -> HealingResult {
        HealingResult {
            success,
            attempts,
            final_content,
            total_duration: start.elapsed(),
            failure_history,
            stopped_early: stopped_early.map(|err| err.to_string()),
        }
    }
}
