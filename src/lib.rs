//! SoulTest library
//!
//! Self-healing layer over the script, flow and generation crates: failure
//! analysis, script refinement and the healing loop, plus configuration.

pub mod config;
pub mod failure;
pub mod replan;
pub mod self_heal;

// Re-export commonly used types for external use
pub use config::{Config, GenerationSettings, HealingSettings, LocatorSettings, ProviderKind};
pub use failure::{CaptureOptions, FailureAnalyzer, FailureCategory, FailureContext};
pub use replan::{strip_code_fences, RefinementEngine};
pub use self_heal::{HealError, HealingOptions, HealingResult, SelfHealingOrchestrator};
