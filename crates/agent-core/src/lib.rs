//! Generation services for script repair.
//!
//! Provides the repair request model, the [`GenerationService`] seam and its
//! providers: a scripted mock, an OpenAI-compatible HTTP client, and a
//! caching decorator with explicit usage tracking.

pub mod cache;
pub mod errors;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod request;
pub mod usage;

pub use cache::{CachedGenerationService, ResponseCache};
pub use errors::GenerationError;
pub use openai::{OpenAiConfig, OpenAiGenerationService};
pub use prompt::PromptBuilder;
pub use provider::{GenerationService, MockGenerationService};
pub use request::{AttemptSummary, Generation, RepairRequest, TokenUsage};
pub use usage::{UsageSnapshot, UsageTracker};
