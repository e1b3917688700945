//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks

use crate::http;
use appforge_core::error::ProviderError;
use appforge_core::message::{Message, MessageToolCall, Role};
use appforge_core::provider::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: http::build_client(http::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = http::build_client(timeout_secs);
        self
    }

    /// Extract system messages from the message list.
    /// Anthropic puts system prompt as a top-level field, not in messages.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let (system, rest): (Vec<&Message>, Vec<&Message>) =
            messages.iter().partition(|m| m.role == Role::System);

        let system = (!system.is_empty()).then(|| {
            system
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        });

        (system, rest)
    }

    /// Convert messages to Anthropic API format with content blocks.
    ///
    /// Consecutive tool results collapse into a single `user` message, one
    /// `tool_result` block per result, in call order.
    fn to_api_messages(messages: &[&Message]) -> Vec<AnthropicMessage> {
        let mut result = Vec::new();
        let mut pending_results: Vec<ContentBlock> = Vec::new();

        for msg in messages {
            if msg.role != Role::Tool && !pending_results.is_empty() {
                result.push(AnthropicMessage {
                    role: "user".into(),
                    content: AnthropicContent::Blocks(std::mem::take(&mut pending_results)),
                });
            }

            match msg.role {
                Role::User => {
                    result.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant if msg.tool_calls.is_empty() => {
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant => {
                    let mut blocks: Vec<ContentBlock> = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(ContentBlock::Text {
                            text: msg.content.clone(),
                        });
                    }
                    for tc in &msg.tool_calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input: tc.arguments.clone(),
                        });
                    }
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
                Role::Tool => {
                    pending_results.push(ContentBlock::ToolResult {
                        tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                        content: msg.content.clone(),
                    });
                }
                Role::System => {} // handled separately
            }
        }

        if !pending_results.is_empty() {
            result.push(AnthropicMessage {
                role: "user".into(),
                content: AnthropicContent::Blocks(pending_results),
            });
        }

        result
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.parameters.clone(),
            })
            .collect()
    }

    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let (system, messages) = Self::extract_system(&request.messages);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&messages),
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        if let Some(sys) = system {
            body["system"] = serde_json::json!(sys);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    /// Text blocks are concatenated as-is; `tool_use` blocks become calls.
    fn response_to_provider_response(resp: AnthropicResponse) -> ProviderResponse {
        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block {
                ResponseContentBlock::Text { text } => text_content.push_str(&text),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(MessageToolCall {
                        id,
                        name,
                        arguments: input,
                    });
                }
                ResponseContentBlock::Other => {}
            }
        }

        let usage = resp.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens.saturating_add(u.output_tokens),
        });

        ProviderResponse {
            message: Message::assistant_with_tools(text_content, tool_calls),
            usage,
            model: resp.model,
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::network_error)?;

        let api_resp: AnthropicResponse = http::read_json(response, "Anthropic").await?;
        Ok(Self::response_to_provider_response(api_resp))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: String,
    content: Vec<ResponseContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Thinking, redacted thinking, and any block type added later.
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, name: &str) -> MessageToolCall {
        MessageToolCall {
            id: id.into(),
            name: name.into(),
            arguments: serde_json::json!({"path": "index.html"}),
        }
    }

    #[test]
    fn constructor_with_base_url() {
        let provider = AnthropicProvider::new("sk-ant-test").with_base_url("http://localhost:9000/");
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.base_url, "http://localhost:9000");
    }

    #[test]
    fn system_is_extracted() {
        let messages = vec![Message::system("Be terse"), Message::user("Hi")];
        let (system, rest) = AnthropicProvider::extract_system(&messages);
        assert_eq!(system.as_deref(), Some("Be terse"));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].role, Role::User);
    }

    #[test]
    fn tool_results_are_grouped_into_one_user_message() {
        let messages = vec![
            Message::user("Fix the header"),
            Message::assistant_with_tools("Looking", vec![call("toolu_1", "read_file"), call("toolu_2", "read_file")]),
            Message::tool_result("toolu_1", "r1"),
            Message::tool_result("toolu_2", "r2"),
            Message::assistant_with_tools("", vec![call("toolu_3", "list_files")]),
            Message::tool_result("toolu_3", "r3"),
        ];
        let refs: Vec<&Message> = messages.iter().collect();
        let api = serde_json::to_value(AnthropicProvider::to_api_messages(&refs)).unwrap();
        let api = api.as_array().unwrap();

        assert_eq!(api.len(), 5);
        assert_eq!(api[0]["content"], "Fix the header");

        assert_eq!(api[1]["role"], "assistant");
        assert_eq!(api[1]["content"][0], serde_json::json!({"type": "text", "text": "Looking"}));
        assert_eq!(api[1]["content"][1]["type"], "tool_use");
        assert_eq!(api[1]["content"][1]["input"]["path"], "index.html");

        assert_eq!(api[2]["role"], "user");
        let blocks = api[2]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], serde_json::json!({"type": "tool_result", "tool_use_id": "toolu_1", "content": "r1"}));
        assert_eq!(blocks[1]["tool_use_id"], "toolu_2");

        // No empty text block when the assistant said nothing
        assert_eq!(api[3]["content"].as_array().unwrap().len(), 1);
        assert_eq!(api[4]["content"][0]["tool_use_id"], "toolu_3");
    }

    #[test]
    fn body_uses_top_level_system_and_input_schema() {
        let request = ProviderRequest {
            model: "claude-sonnet-4-20250514".into(),
            messages: vec![Message::system("You build apps"), Message::user("Hi")],
            temperature: 0.1,
            max_tokens: 8192,
            tools: vec![ToolDefinition {
                name: "read_file".into(),
                description: "Read a file".into(),
                parameters: serde_json::json!({"type": "object", "required": ["path"]}),
            }],
        };
        let body = AnthropicProvider::build_body(&request);
        assert_eq!(body["system"], "You build apps");
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["tools"][0]["input_schema"]["required"][0], "path");
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn parse_text_response() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_01",
                "model": "claude-sonnet-4-20250514",
                "content": [{"type": "text", "text": "Hello"}, {"type": "text", "text": " there"}],
                "usage": {"input_tokens": 10, "output_tokens": 5}
            }"#,
        )
        .unwrap();
        let pr = AnthropicProvider::response_to_provider_response(resp);
        assert_eq!(pr.message.content, "Hello there");
        assert!(pr.message.tool_calls.is_empty());
        assert_eq!(pr.usage.unwrap().total_tokens, 15);
        assert_eq!(pr.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn huge_token_counts_saturate() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_02",
                "model": "claude-sonnet-4-20250514",
                "content": [],
                "usage": {"input_tokens": 4294967295, "output_tokens": 10}
            }"#,
        )
        .unwrap();
        let usage = AnthropicProvider::response_to_provider_response(resp).usage.unwrap();
        assert_eq!(usage.prompt_tokens, u32::MAX);
        assert_eq!(usage.total_tokens, u32::MAX);
    }

    #[test]
    fn parse_tool_use_response() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_02",
                "model": "claude-sonnet-4-20250514",
                "content": [
                    {"type": "thinking", "thinking": "hmm", "signature": "x"},
                    {"type": "text", "text": "Let me write that"},
                    {"type": "tool_use", "id": "toolu_abc", "name": "write_file", "input": {"path": "a.js", "content": "1"}}
                ],
                "usage": {"input_tokens": 20, "output_tokens": 15},
                "stop_reason": "tool_use"
            }"#,
        )
        .unwrap();
        let pr = AnthropicProvider::response_to_provider_response(resp);
        assert_eq!(pr.message.content, "Let me write that");
        assert_eq!(pr.message.tool_calls.len(), 1);
        assert_eq!(pr.message.tool_calls[0].id, "toolu_abc");
        assert_eq!(pr.message.tool_calls[0].arguments["path"], "a.js");
    }
}
