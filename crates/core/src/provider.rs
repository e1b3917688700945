//! Provider trait, the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation plus tool definitions to an
//! LLM and normalize the answer into text and parsed tool calls.
//!
//! Implementations: OpenAI chat completions, Anthropic messages.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single request to a provider: one assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o", "claude-sonnet-4-20250514")
    pub model: String,

    /// The conversation so far, system prompt first
    pub messages: Vec<Message>,

    /// Sampling temperature; kept low to favour tool use over prose
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Response token ceiling
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    8192
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Names listed in the schema's `required` array.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters["required"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

/// A normalized response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The assistant message: text plus parsed tool calls
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(rhs.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(rhs.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(rhs.total_tokens);
    }
}

/// The core Provider trait.
///
/// The agent loop calls `complete()` without knowing which vendor is
/// behind it. Transport failures and vendor error payloads come back as
/// `Err(ProviderError)`, never as a panic.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete, normalized response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults_from_json() {
        let req: ProviderRequest =
            serde_json::from_str(r#"{"model":"gpt-4o","messages":[]}"#).unwrap();
        assert!((req.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 8192);
        assert!(req.tools.is_empty());
    }

    #[test]
    fn required_parameters_from_schema() {
        let tool = ToolDefinition {
            name: "write_file".into(),
            description: "Write a file".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "The file path" },
                    "content": { "type": "string", "description": "The content" }
                },
                "required": ["path", "content"]
            }),
        };
        assert_eq!(tool.required_parameters(), vec!["path", "content"]);
    }

    #[test]
    fn usage_accumulates() {
        let mut total = Usage::default();
        total += Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 };
        total += Usage { prompt_tokens: 20, completion_tokens: 1, total_tokens: 21 };
        assert_eq!(total.total_tokens, 36);
        assert_eq!(total.prompt_tokens, 30);
    }

    #[test]
    fn usage_saturates_instead_of_overflowing() {
        let mut total = Usage { prompt_tokens: u32::MAX - 1, completion_tokens: 0, total_tokens: u32::MAX };
        total += Usage { prompt_tokens: 5, completion_tokens: 7, total_tokens: 12 };
        assert_eq!(total.prompt_tokens, u32::MAX);
        assert_eq!(total.completion_tokens, 7);
        assert_eq!(total.total_tokens, u32::MAX);
    }
}
