use std::sync::Arc;
use std::time::Duration;

use action_flow::{Orchestrator, Subtask, SubtaskStatus, Suite, Task};
use async_trait::async_trait;
use parking_lot::Mutex;
use soultest_core_types::{Command, CommandExecutor, CommandOutcome, CommandType, SelectorSpec};
use soultest_scheduler::NodeStatus;

/// Records every command and fails clicks on `#broken`.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl CommandExecutor for Recorder {
    async fn execute(&self, command: &Command) -> CommandOutcome {
        self.seen.lock().push(command.to_string());
        let broken = command
            .selector
            .as_ref()
            .is_some_and(|selector| selector.value == "#broken");
        if broken {
            CommandOutcome::failed("Element not found: tried css=#broken (timed out)")
        } else {
            CommandOutcome::ok()
        }
    }
}

fn click(selector: &str) -> Command {
    Command::new(CommandType::Click).with_selector(SelectorSpec::css(selector))
}

fn screenshot() -> Command {
    Command::new(CommandType::Screenshot)
}

#[tokio::test]
async fn failing_middle_subtask_blocks_the_rest_and_teardown_runs_once() {
    let recorder = Arc::new(Recorder::default());
    let orchestrator = Orchestrator::new(recorder.clone());
    orchestrator
        .register_subtask(Subtask::new("one", "first", vec![click("#a")]))
        .unwrap();
    orchestrator
        .register_subtask(Subtask::new("two", "second", vec![click("#broken"), click("#never")]))
        .unwrap();
    orchestrator
        .register_subtask(Subtask::new("three", "third", vec![click("#c")]))
        .unwrap();

    let task = Task::new("checkout", "three steps", ["one", "two", "three"])
        .with_teardown(vec![screenshot()]);
    let report = orchestrator.execute_task(&task).await.unwrap();

    assert!(!report.success);
    let error = report.error.unwrap();
    assert!(error.contains("subtask two failed"), "{error}");
    assert_eq!(report.failed_command, Some(click("#broken")));

    assert_eq!(orchestrator.subtask_status("one"), Some(SubtaskStatus::Completed));
    assert_eq!(orchestrator.subtask_status("two"), Some(SubtaskStatus::Failed));
    assert_eq!(orchestrator.subtask_status("three"), Some(SubtaskStatus::Blocked));

    let seen = recorder.seen();
    assert_eq!(seen.iter().filter(|line| line.as_str() == "screenshot").count(), 1);
    assert!(!seen.iter().any(|line| line.contains("#never")));
    assert!(!seen.iter().any(|line| line.contains("#c")));
}

#[tokio::test]
async fn previously_failed_subtask_fails_the_task() {
    let recorder = Arc::new(Recorder::default());
    let orchestrator = Orchestrator::new(recorder.clone());
    orchestrator
        .register_subtask(Subtask::new("a", "", vec![click("#broken")]))
        .unwrap();
    orchestrator
        .register_subtask(Subtask::new("b", "", vec![click("#b")]))
        .unwrap();
    let first = orchestrator.execute_subtask("a").await.unwrap();
    assert!(!first.success);

    let task = Task::new("t", "", ["a", "b"]).with_teardown(vec![screenshot()]);
    let report = orchestrator.execute_task(&task).await.unwrap();

    assert!(!report.success);
    let error = report.error.unwrap();
    assert!(
        error.starts_with("subtask a failed: Element not found"),
        "{error}"
    );
    assert_eq!(orchestrator.subtask_status("a"), Some(SubtaskStatus::Failed));
    assert_eq!(orchestrator.subtask_status("b"), Some(SubtaskStatus::Blocked));
    assert_eq!(recorder.seen(), vec!["click css=#broken", "screenshot"]);

    // The blocked subtask now fails any task that lists it
    let retry = orchestrator
        .execute_task(&Task::new("again", "", ["b"]))
        .await
        .unwrap();
    assert!(!retry.success);
    assert_eq!(retry.error.as_deref(), Some("subtask b is blocked"));
}

#[tokio::test]
async fn completed_subtasks_are_not_run_twice() {
    let recorder = Arc::new(Recorder::default());
    let orchestrator = Orchestrator::new(recorder.clone());
    orchestrator
        .register_subtask(Subtask::new("login", "", vec![click("#login")]))
        .unwrap();
    orchestrator
        .register_subtask(Subtask::new("pay", "", vec![click("#pay")]))
        .unwrap();
    orchestrator.execute_subtask("login").await.unwrap();

    let report = orchestrator
        .execute_task(&Task::new("t", "", ["login", "pay"]))
        .await
        .unwrap();
    assert!(report.success);
    assert_eq!(report.executed, 1);
    assert_eq!(recorder.seen(), vec!["click css=#login", "click css=#pay"]);
}

/// Waits on the tokio clock before succeeding.
struct Slow(Duration);

#[async_trait]
impl CommandExecutor for Slow {
    async fn execute(&self, _command: &Command) -> CommandOutcome {
        tokio::time::sleep(self.0).await;
        CommandOutcome::ok()
    }
}

#[tokio::test(start_paused = true)]
async fn durations_follow_the_tokio_clock() {
    let orchestrator = Orchestrator::new(Arc::new(Slow(Duration::from_secs(30))));
    orchestrator
        .register_subtask(Subtask::new("wait", "", vec![click("#a"), click("#b")]))
        .unwrap();

    let report = orchestrator
        .execute_task(&Task::new("t", "", ["wait"]))
        .await
        .unwrap();
    assert!(report.success);
    assert!(report.duration >= Duration::from_secs(60), "{:?}", report.duration);
}

#[tokio::test]
async fn setup_failure_blocks_every_subtask_but_teardown_still_runs() {
    let recorder = Arc::new(Recorder::default());
    let orchestrator = Orchestrator::new(recorder.clone());
    orchestrator
        .register_subtask(Subtask::new("only", "", vec![click("#a")]))
        .unwrap();

    let task = Task::new("t", "", ["only"])
        .with_setup(vec![click("#broken")])
        .with_teardown(vec![screenshot()]);
    let report = orchestrator.execute_task(&task).await.unwrap();

    assert!(!report.success);
    assert!(report.error.unwrap().starts_with("setup failed"));
    assert_eq!(orchestrator.subtask_status("only"), Some(SubtaskStatus::Blocked));
    assert_eq!(recorder.seen(), vec!["click css=#broken", "screenshot"]);
}

#[tokio::test]
async fn teardown_failure_turns_success_into_failure() {
    let orchestrator = Orchestrator::new(Arc::new(Recorder::default()));
    orchestrator
        .register_subtask(Subtask::new("ok", "", vec![click("#a")]))
        .unwrap();
    let task = Task::new("t", "", ["ok"]).with_teardown(vec![click("#broken")]);

    let report = orchestrator.execute_task(&task).await.unwrap();
    assert!(!report.success);
    assert!(report.error.unwrap().starts_with("teardown failed"));
    assert_eq!(orchestrator.subtask_status("ok"), Some(SubtaskStatus::Completed));
}

#[tokio::test]
async fn suite_blocks_dependents_of_failed_tasks() {
    let manifest = r#"
name: gating
subtasks:
  - id: a-steps
    script: click css=#broken
  - id: b-steps
    script: click css=#b
  - id: c-steps
    script: click css=#c
  - id: d-steps
    script: click css=#d
tasks:
  - id: A
    subtasks: [a-steps]
  - id: B
    subtasks: [b-steps]
  - id: C
    subtasks: [c-steps]
  - id: D
    subtasks: [d-steps]
dependencies:
  B: [A]
  C: [A]
"#;
    let suite = Suite::from_yaml_str(manifest).unwrap();
    let recorder = Arc::new(Recorder::default());
    let orchestrator = Orchestrator::new(recorder.clone());
    let report = orchestrator.execute_suite(&suite).await.unwrap();

    assert!(!report.success());
    assert_eq!(report.outcome("A").unwrap().status, NodeStatus::Failed);
    assert_eq!(report.outcome("D").unwrap().status, NodeStatus::Completed);
    for blocked in ["B", "C"] {
        let outcome = report.outcome(blocked).unwrap();
        assert_eq!(outcome.status, NodeStatus::Blocked);
        assert!(outcome.report.is_none());
    }
    assert_eq!(report.count(NodeStatus::Blocked), 2);
    assert_eq!(orchestrator.subtask_status("b-steps"), Some(SubtaskStatus::Blocked));
    assert_eq!(recorder.seen(), vec!["click css=#broken", "click css=#d"]);
}

#[tokio::test]
async fn suite_runs_tasks_in_dependency_order() {
    let manifest = r#"
subtasks:
  - id: pay
    script: click css=#pay
  - id: login
    script: click css=#login
tasks:
  - id: purchase
    subtasks: [pay]
  - id: sign-in
    subtasks: [login]
dependencies:
  purchase: [sign-in]
"#;
    let suite = Suite::from_yaml_str(manifest).unwrap();
    let recorder = Arc::new(Recorder::default());
    let report = Orchestrator::new(recorder.clone())
        .execute_suite(&suite)
        .await
        .unwrap();

    assert!(report.success());
    assert_eq!(recorder.seen(), vec!["click css=#login", "click css=#pay"]);
}
