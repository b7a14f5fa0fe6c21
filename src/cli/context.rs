use std::path::{Path, PathBuf};

use soultest_cli::Config;

pub struct CliContext {
    config: Config,
    config_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// File the configuration was resolved from, if any location applied
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
