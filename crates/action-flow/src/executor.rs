//! Orchestrator: runs subtasks and tasks over an external command executor

use crate::errors::FlowError;
use crate::suite::Suite;
use crate::types::*;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::json;
use soultest_core_types::{Command, CommandExecutor, CommandOutcome, CommandType};
use soultest_scheduler::NodeStatus;
use soultest_state_center::ExecutionContextManager;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of running a plain command list.
struct CommandRun {
    executed: usize,
    failure: Option<(String, Command)>,
}

/// Drives subtasks through their lifecycle and keeps the execution context
/// in step with what the commands did.
pub struct Orchestrator {
    executor: Arc<dyn CommandExecutor>,
    context: Arc<ExecutionContextManager>,
    subtasks: RwLock<BTreeMap<String, Subtask>>,
}

impl Orchestrator {
    /// Create an orchestrator with a fresh execution context
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self::with_context(executor, Arc::new(ExecutionContextManager::default()))
    }

    pub fn with_context(
        executor: Arc<dyn CommandExecutor>,
        context: Arc<ExecutionContextManager>,
    ) -> Self {
        Self {
            executor,
            context,
            subtasks: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn context(&self) -> &ExecutionContextManager {
        &self.context
    }

    /// Register a subtask. Ids are unique for the orchestrator's lifetime.
    pub fn register_subtask(&self, subtask: Subtask) -> Result<(), FlowError> {
        let mut subtasks = self.subtasks.write();
        if subtasks.contains_key(&subtask.id) {
            return Err(FlowError::DuplicateSubtask(subtask.id));
        }
        debug!("Registered subtask {} ({} commands)", subtask.id, subtask.commands.len());
        subtasks.insert(subtask.id.clone(), subtask);
        Ok(())
    }

    /// Copy of a registered subtask
    pub fn subtask(&self, id: &str) -> Option<Subtask> {
        self.subtasks.read().get(id).cloned()
    }

    pub fn subtask_status(&self, id: &str) -> Option<SubtaskStatus> {
        self.subtasks.read().get(id).map(|subtask| subtask.status)
    }

    /// Move a failed or blocked subtask back to pending.
    pub fn reset_subtask(&self, id: &str) -> Result<(), FlowError> {
        self.transition(id, SubtaskStatus::Pending)?;
        if let Some(subtask) = self.subtasks.write().get_mut(id) {
            subtask.result = None;
        }
        Ok(())
    }

    /// Run one pending subtask.
    ///
    /// Commands run in order; the first failure marks the subtask failed and
    /// skips the rest. Command failures are reported, not returned as errors.
    pub async fn execute_subtask(&self, id: &str) -> Result<ExecutionReport, FlowError> {
        self.transition(id, SubtaskStatus::InProgress)?;
        let (description, commands) = {
            let subtasks = self.subtasks.read();
            let subtask = subtasks
                .get(id)
                .ok_or_else(|| FlowError::UnknownSubtask(id.to_string()))?;
            (subtask.description.clone(), subtask.commands.clone())
        };
        info!("Executing subtask {}: {}", id, description);

        let start = Instant::now();
        let run = self.run_commands(&commands).await;
        let duration = start.elapsed();

        let report = match run.failure {
            None => ExecutionReport::succeeded(duration, run.executed),
            Some((error, command)) => {
                warn!("Subtask {} failed at command {}: {}", id, run.executed, error);
                ExecutionReport::failed(duration, run.executed, error, Some(command))
            }
        };
        self.finish_subtask(id, &report)?;
        Ok(report)
    }

    /// Run setup, the task's subtasks in order, then teardown exactly once.
    ///
    /// A setup failure blocks every subtask. The first subtask failure blocks
    /// the subtasks after it. A listed subtask that already failed or is
    /// blocked counts as that failure; only completed subtasks are skipped.
    /// A teardown failure fails an otherwise successful task.
    pub async fn execute_task(&self, task: &Task) -> Result<ExecutionReport, FlowError> {
        {
            let subtasks = self.subtasks.read();
            if let Some(missing) = task.subtask_ids.iter().find(|id| !subtasks.contains_key(*id)) {
                return Err(FlowError::UnknownSubtask(missing.clone()));
            }
        }
        info!("Executing task {}: {}", task.id, task.description);

        let start = Instant::now();
        let mut executed = 0;
        let mut failure: Option<(String, Option<Command>)> = None;

        if let Some(setup) = &task.setup {
            debug!("Running setup for task {}", task.id);
            let run = self.run_commands(setup).await;
            executed += run.executed;
            if let Some((error, command)) = run.failure {
                failure = Some((format!("setup failed: {error}"), Some(command)));
            }
        }

        for (position, subtask_id) in task.subtask_ids.iter().enumerate() {
            if failure.is_some() {
                self.block_remaining(&task.subtask_ids[position..]);
                break;
            }
            match self.subtask_status(subtask_id) {
                Some(SubtaskStatus::Pending) => {}
                Some(SubtaskStatus::Completed) => {
                    debug!("Skipping completed subtask {}", subtask_id);
                    continue;
                }
                Some(SubtaskStatus::Failed) => {
                    let error = self
                        .last_error(subtask_id)
                        .unwrap_or_else(|| "earlier run failed".to_string());
                    warn!("Subtask {} had already failed: {}", subtask_id, error);
                    failure = Some((format!("subtask {subtask_id} failed: {error}"), None));
                    continue;
                }
                Some(status) => {
                    failure = Some((format!("subtask {subtask_id} is {status}"), None));
                    continue;
                }
                None => return Err(FlowError::UnknownSubtask(subtask_id.clone())),
            }
            let report = self.execute_subtask(subtask_id).await?;
            executed += report.executed;
            if !report.success {
                let error = report.error.unwrap_or_default();
                failure = Some((format!("subtask {subtask_id} failed: {error}"), report.failed_command));
            }
        }

        if let Some(teardown) = &task.teardown {
            debug!("Running teardown for task {}", task.id);
            let run = self.run_commands(teardown).await;
            executed += run.executed;
            if let Some((error, command)) = run.failure {
                match &failure {
                    None => failure = Some((format!("teardown failed: {error}"), Some(command))),
                    Some(_) => warn!("Teardown for task {} also failed: {}", task.id, error),
                }
            }
        }

        let duration = start.elapsed();
        let report = match failure {
            None => {
                info!("Task {} completed in {:?}", task.id, duration);
                ExecutionReport::succeeded(duration, executed)
            }
            Some((error, command)) => {
                warn!("Task {} failed: {}", task.id, error);
                ExecutionReport::failed(duration, executed, error, command)
            }
        };
        Ok(report)
    }

    /// Register a suite's subtasks and run its tasks in dependency order.
    ///
    /// Tasks whose prerequisites failed are reported as blocked and never run.
    pub async fn execute_suite(&self, suite: &Suite) -> Result<SuiteReport, FlowError> {
        suite.validate()?;
        let mut graph = suite.graph()?;
        for subtask in &suite.subtasks {
            self.register_subtask(subtask.clone())?;
        }
        info!("Executing suite {} ({} tasks)", suite.name, graph.node_count());

        let start = Instant::now();
        let mut outcomes = Vec::new();
        while let Some(task_id) = graph.executable_nodes().into_iter().next() {
            let Some(task) = graph.payload(&task_id).cloned() else {
                break;
            };
            graph.update_node(&task_id, NodeStatus::InProgress)?;
            let report = self.execute_task(&task).await?;
            let status = if report.success {
                NodeStatus::Completed
            } else {
                NodeStatus::Failed
            };
            graph.update_node(&task_id, status)?;
            if status == NodeStatus::Failed {
                let blocked = graph.block_dependents(&task_id)?;
                if !blocked.is_empty() {
                    warn!("Task {} failed; blocked {}", task_id, blocked.join(", "));
                }
            }
            outcomes.push(TaskOutcome {
                task_id,
                status,
                report: Some(report),
            });
        }

        for task_id in graph.ids_with_status(NodeStatus::Blocked) {
            if let Some(task) = graph.payload(&task_id) {
                self.block_remaining(&task.subtask_ids);
            }
            outcomes.push(TaskOutcome {
                task_id,
                status: NodeStatus::Blocked,
                report: None,
            });
        }

        Ok(SuiteReport {
            outcomes,
            duration: start.elapsed(),
        })
    }

    async fn run_commands(&self, commands: &[Command]) -> CommandRun {
        let mut executed = 0;
        for (index, command) in commands.iter().enumerate() {
            let command = self.interpolate(command);
            debug!("Executing command {}/{}: {}", index + 1, commands.len(), command);
            executed += 1;
            let outcome = self.executor.execute(&command).await;
            if !outcome.success {
                let error = outcome.error_message().to_string();
                return CommandRun {
                    executed,
                    failure: Some((error, command)),
                };
            }
            self.record(&command, &outcome);
        }
        CommandRun {
            executed,
            failure: None,
        }
    }

    /// Substitute `${name}` in parameter values.
    fn interpolate(&self, command: &Command) -> Command {
        if !command.params.values().any(|value| value.contains("${")) {
            return command.clone();
        }
        let context = self.context.snapshot();
        let mut resolved = command.clone();
        for value in resolved.params.values_mut() {
            *value = context.interpolate(value);
        }
        resolved
    }

    /// Fold a successful command's effects into the execution context.
    fn record(&self, command: &Command, outcome: &CommandOutcome) {
        match command.command_type {
            CommandType::Navigate => {
                if let Some(url) = command.param("url") {
                    self.context.set_current_url(url);
                    self.context.set_variable("current_url", url);
                }
            }
            CommandType::Type | CommandType::Fill => {
                if let (Some(selector), Some(text)) =
                    (&command.selector, command.param_any(&["text", "value"]))
                {
                    self.context.set_variable(selector.key(), text);
                }
            }
            CommandType::SetVariable => {
                if let (Some(name), Some(value)) = (command.param("name"), command.param("value")) {
                    self.context.set_variable(name, value);
                }
            }
            CommandType::GetText | CommandType::GetAttribute => {
                if let (Some(name), Some(output)) = (command.param("store"), &outcome.output) {
                    self.context.set_variable(name, output.clone());
                }
            }
            _ => {}
        }
    }

    fn finish_subtask(&self, id: &str, report: &ExecutionReport) -> Result<(), FlowError> {
        let status = if report.success {
            SubtaskStatus::Completed
        } else {
            SubtaskStatus::Failed
        };
        self.transition(id, status)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("executed".to_string(), json!(report.executed));
        metadata.insert(
            "duration_ms".to_string(),
            json!(report.duration.as_millis() as u64),
        );
        if let Some(error) = &report.error {
            metadata.insert("error".to_string(), json!(error));
        }
        if let Some(subtask) = self.subtasks.write().get_mut(id) {
            subtask.result = Some(SubtaskResult {
                success: report.success,
                timestamp: Utc::now(),
                metadata,
            });
        }
        Ok(())
    }

    /// Error recorded by the subtask's last run
    fn last_error(&self, id: &str) -> Option<String> {
        let subtasks = self.subtasks.read();
        let result = subtasks.get(id)?.result.as_ref()?;
        result.metadata.get("error")?.as_str().map(str::to_string)
    }

    fn block_remaining(&self, ids: &[String]) {
        let mut subtasks = self.subtasks.write();
        for id in ids {
            if let Some(subtask) = subtasks.get_mut(id) {
                if subtask.status.can_transition_to(SubtaskStatus::Blocked) {
                    debug!("Blocking subtask {}", id);
                    subtask.status = SubtaskStatus::Blocked;
                }
            }
        }
    }

    fn transition(&self, id: &str, to: SubtaskStatus) -> Result<(), FlowError> {
        let mut subtasks = self.subtasks.write();
        let subtask = subtasks
            .get_mut(id)
            .ok_or_else(|| FlowError::UnknownSubtask(id.to_string()))?;
        if !subtask.status.can_transition_to(to) {
            return Err(FlowError::InvalidTransition {
                id: id.to_string(),
                from: subtask.status,
                to,
            });
        }
        subtask.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use soultest_core_types::{NoopExecutor, SelectorSpec};

    struct Echo;

    #[async_trait]
    impl CommandExecutor for Echo {
        async fn execute(&self, command: &Command) -> CommandOutcome {
            match command.command_type {
                CommandType::GetText => CommandOutcome::ok_with_output("Welcome"),
                _ => CommandOutcome::ok(),
            }
        }
    }

    #[tokio::test]
    async fn successful_subtask_updates_context() {
        let orchestrator = Orchestrator::new(Arc::new(Echo));
        orchestrator
            .register_subtask(Subtask::new(
                "login",
                "sign in",
                vec![
                    Command::new(CommandType::Navigate).with_param("url", "https://x.test/login"),
                    Command::new(CommandType::Fill)
                        .with_selector(SelectorSpec::css("#email"))
                        .with_param("value", "jane@x.test"),
                    Command::new(CommandType::SetVariable)
                        .with_param("name", "user")
                        .with_param("value", "jane"),
                    Command::new(CommandType::GetText)
                        .with_selector(SelectorSpec::css("h1"))
                        .with_param("store", "greeting"),
                ],
            ))
            .unwrap();

        let report = orchestrator.execute_subtask("login").await.unwrap();
        assert!(report.success);
        assert_eq!(report.executed, 4);

        let ctx = orchestrator.context().context();
        assert_eq!(ctx.current_url.as_deref(), Some("https://x.test/login"));
        assert_eq!(ctx.variable("current_url"), Some("https://x.test/login"));
        assert_eq!(ctx.variable("css=#email"), Some("jane@x.test"));
        assert_eq!(ctx.variable("user"), Some("jane"));
        assert_eq!(ctx.variable("greeting"), Some("Welcome"));

        let subtask = orchestrator.subtask("login").unwrap();
        assert_eq!(subtask.status, SubtaskStatus::Completed);
        let result = subtask.result.unwrap();
        assert!(result.success);
        assert_eq!(result.metadata["executed"], json!(4));
    }

    #[tokio::test]
    async fn completed_subtask_cannot_rerun() {
        let orchestrator = Orchestrator::new(Arc::new(NoopExecutor));
        orchestrator
            .register_subtask(Subtask::new("s", "", vec![Command::new(CommandType::Reload)]))
            .unwrap();
        orchestrator.execute_subtask("s").await.unwrap();
        let err = orchestrator.execute_subtask("s").await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidTransition { from: NodeStatus::Completed, to: NodeStatus::InProgress, .. }
        ));
        assert!(orchestrator.reset_subtask("s").is_err());
    }

    #[tokio::test]
    async fn unknown_and_duplicate_subtasks() {
        let orchestrator = Orchestrator::new(Arc::new(NoopExecutor));
        assert!(matches!(
            orchestrator.execute_subtask("ghost").await,
            Err(FlowError::UnknownSubtask(_))
        ));
        orchestrator.register_subtask(Subtask::new("a", "", vec![])).unwrap();
        assert!(matches!(
            orchestrator.register_subtask(Subtask::new("a", "", vec![])),
            Err(FlowError::DuplicateSubtask(_))
        ));
    }

    #[tokio::test]
    async fn params_are_interpolated_from_variables() {
        let orchestrator = Orchestrator::new(Arc::new(NoopExecutor));
        orchestrator.context().set_variable("host", "x.test");
        orchestrator
            .register_subtask(Subtask::new(
                "go",
                "",
                vec![Command::new(CommandType::Navigate).with_param("url", "https://${host}/home")],
            ))
            .unwrap();
        orchestrator.execute_subtask("go").await.unwrap();
        assert_eq!(
            orchestrator.context().variable("current_url").as_deref(),
            Some("https://x.test/home")
        );
    }
}
