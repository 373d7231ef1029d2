//! Provider client — the single point of entry for all model calls.
//!
//! ARCHITECTURAL RULE: no other module may call a completion API directly.
//! Agents depend on the [`ProviderClient`] trait; the shipped implementation
//! is [`AnthropicClient`]. Transient provider failures are surfaced once —
//! the pipeline isolates them per job instead of retrying.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Model used for cheap extraction calls (parsing, scoring).
pub const FAST_MODEL: &str = "claude-haiku-4-5";
/// Model used for generation and auditing (tailoring, cover letter, guard).
pub const QUALITY_MODEL: &str = "claude-sonnet-4-5";

/// Which model a stage runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Fast,
    Quality,
}

impl ModelTier {
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelTier::Fast => FAST_MODEL,
            ModelTier::Quality => QUALITY_MODEL,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,
}

/// Provider-reported token usage for one completion.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// One completed model call. `usage` is present when the provider reported
/// it; callers fall back to a character estimate otherwise.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// The narrow capability the engine depends on. Injected so tests can
/// script responses without a network.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn complete(
        &self,
        tier: ModelTier,
        max_tokens: u32,
        system: &str,
        user: &str,
    ) -> Result<Completion, ProviderError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    async fn complete(
        &self,
        tier: ModelTier,
        max_tokens: u32,
        system: &str,
        user: &str,
    ) -> Result<Completion, ProviderError> {
        let request_body = AnthropicRequest {
            model: tier.model_id(),
            max_tokens,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            model = tier.model_id(),
            "completion succeeded"
        );

        let text = parsed
            .content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.clone())
            .ok_or(ProviderError::EmptyContent)?;

        Ok(Completion {
            text,
            usage: Some(parsed.usage),
        })
    }
}

/// Normalizes a model response into the JSON payload it carries: strips
/// markdown code fences, then trims to the outermost JSON object or array.
/// Agents never re-implement this.
pub fn extract_json(text: &str) -> &str {
    let text = strip_json_fences(text);
    let object = text.find('{').map(|start| {
        let end = text.rfind('}').map(|e| e + 1).unwrap_or(text.len());
        &text[start..end]
    });
    let array = text.find('[').map(|start| {
        let end = text.rfind(']').map(|e| e + 1).unwrap_or(text.len());
        &text[start..end]
    });
    match (object, array) {
        (Some(o), Some(a)) => {
            // Whichever opens first is the payload.
            if text.find('{') < text.find('[') {
                o
            } else {
                a
            }
        }
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => text,
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_extract_json_plain_object() {
        assert_eq!(extract_json("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_with_prose_around_object() {
        let input = "Here is the result:\n{\"a\": 1}\nHope that helps!";
        assert_eq!(extract_json(input), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_fenced_array() {
        let input = "```json\n[1, 2, 3]\n```";
        assert_eq!(extract_json(input), "[1, 2, 3]");
    }

    #[test]
    fn test_model_tier_ids_differ() {
        assert_ne!(ModelTier::Fast.model_id(), ModelTier::Quality.model_id());
    }
}
