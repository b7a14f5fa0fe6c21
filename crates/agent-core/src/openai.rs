use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::GenerationError;
use crate::prompt::PromptBuilder;
use crate::provider::GenerationService;
use crate::request::{Generation, RepairRequest, TokenUsage};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Tried in order; a rate-limited key hands over to the next one
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// OpenAI-compatible chat completions provider.
pub struct OpenAiGenerationService {
    client: Client,
    prompt: PromptBuilder,
    config: OpenAiConfig,
}

impl OpenAiGenerationService {
    pub fn new(config: OpenAiConfig) -> Result<Self, GenerationError> {
        if config.api_keys.is_empty() {
            return Err(GenerationError::invalid_request(
                "missing API key for generation service",
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                GenerationError::invalid_request(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            prompt: PromptBuilder::new(),
            config,
        })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    fn body(&self, request: &RepairRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.prompt.system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.prompt.build_user_prompt(request),
                },
            ],
        }
    }
}

#[async_trait]
impl GenerationService for OpenAiGenerationService {
    async fn generate(&self, request: &RepairRequest) -> Result<Generation, GenerationError> {
        let url = self.endpoint();
        let body = self.body(request);

        let mut last_error: Option<GenerationError> = None;
        for (index, key) in self.config.api_keys.iter().enumerate() {
            debug!(model = %self.config.model, attempt = index + 1, "requesting repair");
            let response = match self
                .client
                .post(&url)
                .bearer_auth(key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) => {
                    last_error = Some(GenerationError::Transport(err.to_string()));
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response unavailable>".to_string());
                if status.as_u16() == 429 {
                    let friendly = rate_limit_message(&text);
                    warn!(
                        message = %friendly,
                        attempt = index + 1,
                        remaining = self.config.api_keys.len() - index - 1,
                        "generation request rate limited"
                    );
                    last_error = Some(GenerationError::RateLimited(friendly));
                    continue;
                }
                return Err(GenerationError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let response: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|err| GenerationError::invalid_response(err.to_string()))?;
            let text = response
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_text())
                .ok_or_else(|| GenerationError::invalid_response("response missing content"))?;
            return Ok(Generation {
                text,
                usage: response.usage.map(|usage| TokenUsage {
                    prompt_tokens: usage.prompt_tokens,
                    completion_tokens: usage.completion_tokens,
                }),
            });
        }

        Err(last_error.unwrap_or_else(|| {
            GenerationError::invalid_request("generation request exhausted all API keys")
        }))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: ChatCompletionContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        match self {
            ChatCompletionContent::Text(value) => Some(value.clone()),
            ChatCompletionContent::Parts(parts) => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.text.as_ref())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n");
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: Option<String>,
}

fn rate_limit_message(raw: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(raw) {
        if let Some(message) = envelope.error.message {
            return format!("rate limit exceeded: {}", message.trim());
        }
    }
    "rate limit exceeded; retry later".to_string()
}
