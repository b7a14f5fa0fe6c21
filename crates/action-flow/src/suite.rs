//! Suite manifests: subtasks, tasks and task ordering in one YAML file.
//!
//! ```yaml
//! name: checkout
//! subtasks:
//!   - id: login
//!     script: |
//!       navigate url=https://shop.test/login
//!       fill label="Email" value=jane@shop.test
//! tasks:
//!   - id: sign-in
//!     subtasks: [login]
//!     teardown: |
//!       screenshot
//! dependencies:
//!   pay: [sign-in]
//! ```

use crate::errors::FlowError;
use crate::types::{Subtask, Task};
use action_script::parse_content;
use serde::{Deserialize, Serialize};
use soultest_core_types::Command;
use soultest_scheduler::DependencyGraph;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Raw manifest as written on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskEntry>,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
    /// Task id to the task ids that must complete first
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskEntry {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub script: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub setup: Option<String>,
    #[serde(default)]
    pub teardown: Option<String>,
}

/// Parsed suite ready to execute.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    pub name: String,
    pub subtasks: Vec<Subtask>,
    pub tasks: Vec<Task>,
    /// `(before, after)` pairs between task ids
    pub dependencies: Vec<(String, String)>,
}

impl Suite {
    /// Load and parse a manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut suite = Self::from_yaml_str(&text)?;
        if suite.name.is_empty() {
            suite.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(suite)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, FlowError> {
        let manifest: SuiteManifest = serde_yaml::from_str(text)?;
        Self::from_manifest(manifest)
    }

    /// Parse every embedded script and validate references.
    pub fn from_manifest(manifest: SuiteManifest) -> Result<Self, FlowError> {
        let subtasks = manifest
            .subtasks
            .into_iter()
            .map(|entry| {
                let script =
                    parse_content(&entry.script).map_err(|err| FlowError::script(&entry.id, err))?;
                Ok(Subtask::new(entry.id, entry.description, script.to_vec()))
            })
            .collect::<Result<Vec<_>, FlowError>>()?;

        let tasks = manifest
            .tasks
            .into_iter()
            .map(|entry| {
                let setup = parse_optional(&entry.id, "setup", entry.setup.as_deref())?;
                let teardown = parse_optional(&entry.id, "teardown", entry.teardown.as_deref())?;
                Ok(Task {
                    id: entry.id,
                    description: entry.description,
                    subtask_ids: entry.subtasks,
                    setup,
                    teardown,
                })
            })
            .collect::<Result<Vec<_>, FlowError>>()?;

        let dependencies = manifest
            .dependencies
            .into_iter()
            .flat_map(|(task, before)| before.into_iter().map(move |dep| (dep, task.clone())))
            .collect();

        let suite = Suite {
            name: manifest.name.unwrap_or_default(),
            subtasks,
            tasks,
            dependencies,
        };
        suite.validate()?;
        Ok(suite)
    }

    /// Structural checks that do not need the graph.
    pub fn validate(&self) -> Result<(), FlowError> {
        let mut subtask_ids = HashSet::new();
        for subtask in &self.subtasks {
            if !subtask_ids.insert(subtask.id.as_str()) {
                return Err(FlowError::DuplicateSubtask(subtask.id.clone()));
            }
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        let mut task_ids = HashSet::new();
        for task in &self.tasks {
            if !task_ids.insert(task.id.as_str()) {
                return Err(FlowError::DuplicateTask(task.id.clone()));
            }
            for subtask_id in &task.subtask_ids {
                if !subtask_ids.contains(subtask_id.as_str()) {
                    return Err(FlowError::UnknownSubtask(subtask_id.clone()));
                }
                if let Some(owner) = owners.insert(subtask_id, &task.id) {
                    return Err(FlowError::InvalidSuite(format!(
                        "subtask {subtask_id} is used by both {owner} and {}",
                        task.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Task ordering graph. Rejects unknown task ids and cycles.
    pub fn graph(&self) -> Result<DependencyGraph<Task>, FlowError> {
        let mut graph = DependencyGraph::new();
        for task in &self.tasks {
            graph.add_node(task.id.clone(), task.clone())?;
        }
        for (before, after) in &self.dependencies {
            graph.add_edge(before, after)?;
        }
        debug!(
            "Built task graph with {} tasks and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|subtask| subtask.id == id)
    }
}

fn parse_optional(
    task_id: &str,
    phase: &str,
    script: Option<&str>,
) -> Result<Option<Vec<Command>>, FlowError> {
    script
        .map(|text| {
            parse_content(text)
                .map(|script| script.to_vec())
                .map_err(|err| FlowError::script(format!("{task_id} {phase}"), err))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use soultest_core_types::CommandType;

    const MANIFEST: &str = r#"
name: checkout
subtasks:
  - id: login
    description: sign in
    script: |
      navigate url=https://shop.test/login
      fill label="Email" value=jane@shop.test
      click text="Sign in"
  - id: pay
    script: |
      click css=#pay
tasks:
  - id: sign-in
    subtasks: [login]
    teardown: |
      screenshot
  - id: purchase
    subtasks: [pay]
dependencies:
  purchase: [sign-in]
"#;

    #[test]
    fn parses_manifest() {
        let suite = Suite::from_yaml_str(MANIFEST).unwrap();
        assert_eq!(suite.name, "checkout");
        assert_eq!(suite.subtasks.len(), 2);
        let login = suite.subtask("login").unwrap();
        assert_eq!(login.commands.len(), 3);
        assert_eq!(login.commands[1].command_type, CommandType::Fill);
        let teardown = suite.tasks[0].teardown.as_ref().unwrap();
        assert_eq!(teardown[0].command_type, CommandType::Screenshot);
        assert_eq!(
            suite.dependencies,
            vec![("sign-in".to_string(), "purchase".to_string())]
        );
        let graph = suite.graph().unwrap();
        assert_eq!(graph.topological_sort().unwrap(), vec!["sign-in", "purchase"]);
    }

    #[test]
    fn script_errors_name_the_subtask_and_line() {
        let err = Suite::from_yaml_str(
            "subtasks:\n  - id: broken\n    script: |\n      navigate url=x\n      explode css=a\n",
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("broken"), "{message}");
        assert!(message.contains("line 2"), "{message}");
    }

    #[test]
    fn rejects_unknown_and_shared_subtasks() {
        let unknown = "subtasks: []\ntasks:\n  - id: t\n    subtasks: [ghost]\n";
        assert!(matches!(
            Suite::from_yaml_str(unknown),
            Err(FlowError::UnknownSubtask(id)) if id == "ghost"
        ));

        let shared = "subtasks:\n  - id: s\n    script: reload\ntasks:\n  - id: a\n    subtasks: [s]\n  - id: b\n    subtasks: [s]\n";
        assert!(matches!(
            Suite::from_yaml_str(shared),
            Err(FlowError::InvalidSuite(_))
        ));
    }

    #[test]
    fn cyclic_dependencies_fail_graph_construction() {
        let text = "tasks:\n  - id: a\n  - id: b\ndependencies:\n  a: [b]\n  b: [a]\n";
        let suite = Suite::from_yaml_str(text).unwrap();
        let err = suite.graph().unwrap_err();
        assert!(matches!(err, FlowError::Graph(ref graph) if graph.is_cycle()));
    }

    #[test]
    fn load_uses_file_stem_as_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke.yaml");
        std::fs::write(&path, "tasks:\n  - id: only\n").unwrap();
        let suite = Suite::load(&path).unwrap();
        assert_eq!(suite.name, "smoke");
        assert_eq!(suite.tasks.len(), 1);
    }
}
