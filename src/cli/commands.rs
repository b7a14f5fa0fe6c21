use clap::Subcommand;

use super::check::CheckArgs;
use super::config::ConfigArgs;
use super::plan::PlanArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Parse a test script and list its commands
    Check(CheckArgs),

    /// Validate a suite manifest and print its execution order
    Plan(PlanArgs),

    /// Configuration management
    Config(ConfigArgs),
}
