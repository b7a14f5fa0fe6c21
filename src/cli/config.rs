use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_yaml;

use super::output::OutputFormat;
use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Validate configuration
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let config = ctx.config();
    match args.action {
        ConfigAction::Show => {
            if output.print_structured(config)? {
                return Ok(());
            }
            match ctx.config_path().filter(|path| path.exists()) {
                Some(path) => println!("Current configuration ({}):", path.display()),
                None => println!("Current configuration (defaults):"),
            }
            print!("{}", serde_yaml::to_string(config)?);
        }
        ConfigAction::Validate => {
            let mut problems = Vec::new();
            if config.healing.max_attempts == 0 {
                problems.push("healing.max_attempts must be at least 1".to_string());
            }
            if !(0.0..=2.0).contains(&config.generation.temperature) {
                problems.push(format!(
                    "generation.temperature {} is outside 0.0..=2.0",
                    config.generation.temperature
                ));
            }
            if config.locator.poll_interval.is_zero() {
                problems.push("locator.poll_interval must be positive".to_string());
            }
            if config.locator.poll_interval > config.locator.attempt_timeout {
                problems.push("locator.poll_interval exceeds locator.attempt_timeout".to_string());
            }
            if !problems.is_empty() {
                bail!("Invalid configuration:\n  {}", problems.join("\n  "));
            }
            println!("Configuration is valid");
        }
    }
    Ok(())
}
