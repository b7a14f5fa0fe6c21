use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print `value` in a machine format. Returns `false` for `Human` so the
    /// caller can render its own text.
    pub fn print_structured<T: Serialize>(self, value: &T) -> Result<bool> {
        match self {
            OutputFormat::Human => Ok(false),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value)?);
                Ok(true)
            }
            OutputFormat::Yaml => {
                print!("{}", serde_yaml::to_string(value)?);
                Ok(true)
            }
        }
    }
}
