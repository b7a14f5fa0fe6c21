use std::sync::Arc;

use agent_core::{GenerationError, GenerationService, RepairRequest};
use tracing::{debug, info};

use crate::failure::FailureContext;

/// Asks a generation service for a repaired script.
///
/// The candidate is returned as text with any code fence removed; whether it
/// parses or passes is for the caller to find out.
pub struct RefinementEngine {
    generator: Arc<dyn GenerationService>,
}

impl RefinementEngine {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self { generator }
    }

    /// Repair request for the current failure, with every earlier attempt summarised.
    pub fn build_request(
        test_name: &str,
        content: &str,
        current: &FailureContext,
        previous: &[FailureContext],
    ) -> RepairRequest {
        RepairRequest {
            test_name: test_name.to_string(),
            content: content.to_string(),
            error_message: current.error_message.clone(),
            failed_command: current.failed_command.as_ref().map(ToString::to_string),
            category: current.category.as_str().to_string(),
            available_selectors: current.available_selectors.clone(),
            page_html: current.page_html.clone(),
            previous_attempts: previous.iter().map(FailureContext::summary).collect(),
        }
    }

    pub async fn refine(
        &self,
        test_name: &str,
        content: &str,
        current: &FailureContext,
        previous: &[FailureContext],
    ) -> Result<String, GenerationError> {
        let request = Self::build_request(test_name, content, current, previous);
        info!(
            "Requesting repair for {} from {} (attempt {}, {})",
            test_name,
            self.generator.name(),
            current.attempt_index,
            current.category
        );
        let raw = self.generator.repair(&request).await?;
        let cleaned = strip_code_fences(&raw);
        debug!(lines = cleaned.lines().count(), "received candidate script");
        Ok(cleaned)
    }
}

/// Remove a Markdown code fence wrapper, keeping the fenced body.
///
/// Text before the opening fence is dropped; unfenced text is only trimmed.
pub fn strip_code_fences(raw: &str) -> String {
    let fence = "```";
    let Some(start) = raw.find(fence) else {
        return raw.trim().to_string();
    };
    let after_fence = &raw[start + fence.len()..];
    // Skip the info string (`json`, `text`, ...) up to the end of the line.
    let body = match after_fence.find('\n') {
        Some(newline) => &after_fence[newline + 1..],
        None => after_fence,
    };
    let body = match body.find(fence) {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureCategory;
    use agent_core::MockGenerationService;
    use soultest_core_types::{Command, CommandType, SelectorSpec};

    fn failure(attempt: u32, category: FailureCategory, error: &str) -> FailureContext {
        FailureContext {
            error_message: error.to_string(),
            failed_command: Some(
                Command::new(CommandType::Click).with_selector(SelectorSpec::css("#go")),
            ),
            category,
            available_selectors: vec!["css=#submit".to_string()],
            page_html: Some("<button id=\"submit\"/>".to_string()),
            screenshot: None,
            attempt_index: attempt,
        }
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```json\nclick css=#a\n```"), "click css=#a");
        assert_eq!(strip_code_fences("```\nclick css=#a\nreload\n```\n"), "click css=#a\nreload");
        assert_eq!(
            strip_code_fences("Here you go:\n```text\nclick css=#a\n```\nGood luck"),
            "click css=#a"
        );
        assert_eq!(strip_code_fences("  click css=#a  \n"), "click css=#a");
        assert_eq!(strip_code_fences("```\nclick css=#a"), "click css=#a");
    }

    #[test]
    fn request_summarises_previous_attempts() {
        let previous = vec![failure(1, FailureCategory::Timeout, "timed out")];
        let current = failure(2, FailureCategory::SelectorNotFound, "Element not found");
        let request = RefinementEngine::build_request("login", "click css=#go", &current, &previous);
        assert_eq!(request.category, "SELECTOR_NOT_FOUND");
        assert_eq!(request.failed_command.as_deref(), Some("click css=#go"));
        assert_eq!(request.available_selectors, vec!["css=#submit"]);
        assert!(request.page_html.is_some());
        assert_eq!(request.previous_attempts.len(), 1);
        assert_eq!(request.previous_attempts[0].category, "TIMEOUT");
    }

    #[tokio::test]
    async fn refine_cleans_the_reply() {
        let generator = Arc::new(MockGenerationService::new(["```\nclick css=#submit\n```"]));
        let engine = RefinementEngine::new(generator.clone());
        let current = failure(1, FailureCategory::SelectorNotFound, "Element not found");
        let candidate = engine.refine("login", "click css=#go", &current, &[]).await.unwrap();
        assert_eq!(candidate, "click css=#submit");
        assert_eq!(generator.requests()[0].test_name, "login");
    }
}
