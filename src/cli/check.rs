use std::path::PathBuf;

use action_script::parse_content;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use soultest_core_types::Command;
use tokio::fs;

use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Test script to parse
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    file: String,
    commands: &'a [Command],
}

pub async fn cmd_check(args: CheckArgs, output: OutputFormat) -> Result<()> {
    let content = fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let script = parse_content(&content)
        .with_context(|| format!("{} is not a valid test script", args.file.display()))?;

    let report = CheckReport {
        file: args.file.display().to_string(),
        commands: script.commands(),
    };
    if output.print_structured(&report)? {
        return Ok(());
    }

    println!("{}: {} command(s)", report.file, script.len());
    for (idx, command) in script.iter().enumerate() {
        println!("{:>4}  {}", idx + 1, command);
    }
    Ok(())
}
