use std::path::PathBuf;

use action_flow::Suite;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct PlanArgs {
    /// Suite manifest (YAML)
    #[arg(value_name = "SUITE")]
    pub suite: PathBuf,
}

#[derive(Serialize)]
struct PlannedTask {
    id: String,
    description: String,
    after: Vec<String>,
    subtasks: Vec<String>,
}

#[derive(Serialize)]
struct PlanReport {
    suite: String,
    order: Vec<PlannedTask>,
}

pub async fn cmd_plan(args: PlanArgs, output: OutputFormat) -> Result<()> {
    let suite = Suite::load(&args.suite)
        .with_context(|| format!("Failed to load suite {}", args.suite.display()))?;
    let graph = suite.graph().context("Suite dependencies are invalid")?;
    let order = graph.topological_sort().context("Suite cannot be ordered")?;

    let mut planned = Vec::with_capacity(order.len());
    for id in order {
        let Some(task) = graph.payload(&id) else {
            continue;
        };
        planned.push(PlannedTask {
            after: graph.predecessors(&id)?,
            id,
            description: task.description.clone(),
            subtasks: task.subtask_ids.clone(),
        });
    }
    let report = PlanReport {
        suite: suite.name.clone(),
        order: planned,
    };
    if output.print_structured(&report)? {
        return Ok(());
    }

    println!(
        "Suite '{}': {} task(s), {} subtask(s)",
        report.suite,
        suite.tasks.len(),
        suite.subtasks.len()
    );
    for (idx, task) in report.order.iter().enumerate() {
        let after = if task.after.is_empty() {
            String::new()
        } else {
            format!(" (after {})", task.after.join(", "))
        };
        println!("{:>3}. {}{}", idx + 1, task.id, after);
        for subtask in &task.subtasks {
            println!("       - {}", subtask);
        }
    }
    Ok(())
}
