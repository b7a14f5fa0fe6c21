//! Configuration management module
//!
//! YAML configuration with three sections (`healing`, `generation`,
//! `locator`), environment overrides applied after loading, and builders for
//! the runtime components each section configures.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_locator::LocatorConfig;
use agent_core::{
    CachedGenerationService, GenerationError, GenerationService, MockGenerationService,
    OpenAiConfig, OpenAiGenerationService, ResponseCache, UsageTracker,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::failure::CaptureOptions;
use crate::self_heal::HealingOptions;

pub const ENV_MAX_ATTEMPTS: &str = "SOULTEST_MAX_ATTEMPTS";
pub const ENV_MODEL: &str = "SOULTEST_MODEL";
pub const ENV_ENDPOINT: &str = "SOULTEST_ENDPOINT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub healing: HealingSettings,
    pub generation: GenerationSettings,
    pub locator: LocatorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealingSettings {
    pub max_attempts: u32,
    pub capture_html: bool,
    pub capture_screenshot: bool,
}

impl Default for HealingSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            capture_html: true,
            capture_screenshot: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Mock,
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: ProviderKind,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
    pub temperature: f32,
    /// Cached responses kept in memory; 0 disables caching
    pub cache_capacity: usize,
    pub price_per_1k_tokens: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout: Duration::from_secs(60),
            temperature: 0.2,
            cache_capacity: 64,
            price_per_1k_tokens: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    #[serde(with = "humantime_duration")]
    pub attempt_timeout: Duration,
    #[serde(with = "humantime_duration")]
    pub poll_interval: Duration,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        let defaults = LocatorConfig::default();
        Self {
            attempt_timeout: defaults.attempt_timeout,
            poll_interval: defaults.poll_interval,
        }
    }
}

impl Config {
    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Candidate config locations: `./config/config.yaml`, then the user config dir.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from("config/config.yaml");
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir().map(|mut path| {
            path.push("soultest");
            path.push("config.yaml");
            path
        })
    }

    /// Apply `SOULTEST_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
            match raw.trim().parse::<u32>() {
                Ok(value) if value > 0 => self.healing.max_attempts = value,
                _ => warn!("Ignoring invalid {}={}", ENV_MAX_ATTEMPTS, raw),
            }
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|value| !value.trim().is_empty()) {
            self.generation.model = model.trim().to_string();
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|value| !value.trim().is_empty()) {
            self.generation.endpoint = endpoint.trim().to_string();
        }
    }

    pub fn healing_options(&self) -> HealingOptions {
        HealingOptions {
            max_attempts: self.healing.max_attempts,
            capture: CaptureOptions {
                capture_html: self.healing.capture_html,
                capture_screenshot: self.healing.capture_screenshot,
            },
        }
    }

    pub fn locator_config(&self) -> LocatorConfig {
        LocatorConfig {
            attempt_timeout: self.locator.attempt_timeout,
            poll_interval: self.locator.poll_interval,
        }
    }
}

impl GenerationSettings {
    /// Build the configured provider wrapped in the cache and usage tracker.
    pub fn build_service(
        &self,
        usage: Arc<UsageTracker>,
    ) -> Result<Arc<dyn GenerationService>, GenerationError> {
        let inner: Arc<dyn GenerationService> = match self.provider {
            ProviderKind::Mock => Arc::new(MockGenerationService::default()),
            ProviderKind::OpenAi => {
                let key = std::env::var(&self.api_key_env).map_err(|_| {
                    GenerationError::invalid_request(format!(
                        "environment variable {} is not set",
                        self.api_key_env
                    ))
                })?;
                Arc::new(OpenAiGenerationService::new(OpenAiConfig {
                    api_keys: key
                        .split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect(),
                    model: self.model.clone(),
                    api_base: self.endpoint.clone(),
                    temperature: self.temperature,
                    timeout: self.timeout,
                })?)
            }
        };
        Ok(Arc::new(CachedGenerationService::new(
            inner,
            Arc::new(ResponseCache::new(self.cache_capacity)),
            usage,
        )))
    }
}

/// Durations written the human way (`2s`, `150ms`, `1m 30s`).
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
