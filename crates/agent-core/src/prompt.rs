use crate::request::RepairRequest;

const LANGUAGE_OVERVIEW: &str = "- One command per line: `<command> [<strategy>=<value> [fallback <strategy>=<value>]...] [<key>=<value> ...]`.\n- Strategies: css, xpath, text, placeholder, label, role, testid. Quote values containing spaces.\n- Lines starting with `#` are comments.\n- Prefer selectors from the available list and add fallbacks when the page is ambiguous.\n";

/// Longest HTML excerpt included in a prompt, in characters.
pub const MAX_HTML_CHARS: usize = 8_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn system_prompt(&self) -> &'static str {
        "You repair failing browser test scripts. Reply with the complete corrected script only, one command per line, without explanations."
    }

    pub fn build_user_prompt(&self, request: &RepairRequest) -> String {
        let mut sections = Vec::new();
        sections.push(format!("Command language:\n{LANGUAGE_OVERVIEW}"));
        sections.push(format!("Test: {}", request.test_name));
        sections.push(format!("Current script:\n{}", request.content.trim_end()));
        sections.push(format!("Failure category: {}", request.category));
        sections.push(format!("Error: {}", request.error_message));
        if let Some(command) = &request.failed_command {
            sections.push(format!("Failed command: {command}"));
        }
        if !request.available_selectors.is_empty() {
            sections.push(format!(
                "Available selectors:\n{}",
                request
                    .available_selectors
                    .iter()
                    .map(|selector| format!("- {selector}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            ));
        }
        if let Some(html) = &request.page_html {
            sections.push(format!("Page HTML:\n{}", truncate_chars(html, MAX_HTML_CHARS)));
        }
        if !request.previous_attempts.is_empty() {
            sections.push(format!(
                "Previous attempts:\n{}",
                request
                    .previous_attempts
                    .iter()
                    .map(|attempt| format!("- {}", attempt.render()))
                    .collect::<Vec<_>>()
                    .join("\n")
            ));
        }
        sections.push("Return the full corrected script.".to_string());
        sections.join("\n\n")
    }
}

fn truncate_chars(value: &str, limit: usize) -> &str {
    match value.char_indices().nth(limit) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
