//! Tool trait and registry: what the agent can do to the file store.
//!
//! Every tool operates on a [`VirtualFileMap`] that the caller lends for the
//! duration of one call. Tools are synchronous: there is no I/O beyond the
//! map itself.

use crate::error::ToolError;
use crate::files::VirtualFileMap;
use crate::provider::ToolDefinition;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool call id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a parsed JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution, always returned as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Human-readable output on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Error message on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Paths created, updated, or deleted by this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_changed: Option<Vec<String>>,
}

impl ToolResult {
    /// A successful result with output text.
    pub fn ok(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
            files_changed: None,
        }
    }

    /// A successful result that also reports changed paths.
    pub fn ok_with_changes(result: impl Into<String>, files_changed: Vec<String>) -> Self {
        Self {
            files_changed: Some(files_changed),
            ..Self::ok(result)
        }
    }

    /// A failed result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            files_changed: None,
        }
    }
}

/// The core Tool trait.
///
/// Each file operation (read_file, write_file, list_files, ...) implements
/// this trait and is registered in a [`ToolRegistry`].
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM verbatim).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool against the file store.
    ///
    /// Validation and not-found failures are returned as `Err`; the
    /// registry turns them into failed [`ToolResult`]s.
    fn execute(
        &self,
        arguments: &serde_json::Value,
        files: &mut VirtualFileMap,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Fetch a required string argument.
pub fn required_str<'a>(arguments: &'a serde_json::Value, name: &str) -> std::result::Result<&'a str, ToolError> {
    arguments[name]
        .as_str()
        .ok_or_else(|| ToolError::MissingParameter(name.to_string()))
}

/// Fetch a required string argument that must not be blank.
pub fn required_non_empty<'a>(
    arguments: &'a serde_json::Value,
    name: &str,
) -> std::result::Result<&'a str, ToolError> {
    match required_str(arguments, name)? {
        s if s.trim().is_empty() => Err(ToolError::MissingParameter(name.to_string())),
        s => Ok(s),
    }
}

/// Fetch an optional string argument; blank counts as absent.
pub fn optional_str<'a>(arguments: &'a serde_json::Value, name: &str) -> Option<&'a str> {
    arguments[name].as_str().filter(|s| !s.trim().is_empty())
}

/// An ordered registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Dispatch tool calls the LLM requests
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name,
    /// keeping its position.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// All tool definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool call. Never fails: every problem becomes a failed
    /// [`ToolResult`].
    pub fn dispatch(&self, call: &ToolCall, files: &mut VirtualFileMap) -> ToolResult {
        let outcome = match self.get(&call.name) {
            Some(tool) => tool.execute(&call.arguments, files),
            None => Err(ToolError::UnknownTool(call.name.clone())),
        };

        match outcome {
            Ok(result) => {
                debug!(tool = %call.name, call_id = %call.id, success = result.success, "Tool dispatched");
                result
            }
            Err(e) => {
                debug!(tool = %call.name, call_id = %call.id, error = %e, "Tool failed");
                ToolResult::failure(e.to_string())
            }
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
