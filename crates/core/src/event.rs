//! Agent events: the user-visible trace of a run.
//!
//! The loop appends one event per observable step. Callers get the full
//! ordered list when the run ends; the gateway serializes it verbatim.

use crate::tool::ToolResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observable step of an agent run.
///
/// Serialized with a `type` tag, e.g. `{"type":"tool_call","tool":"read_file",...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The model asked for a tool.
    ToolCall {
        tool: String,
        arguments: serde_json::Value,
    },

    /// A tool finished (successfully or not).
    ToolResult { tool: String, result: ToolResult },

    /// Assistant prose.
    Text { content: String },

    /// A fatal error ended the run.
    Error { message: String },

    /// The run finished; carries the final file map.
    Complete {
        files: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
}

impl AgentEvent {
    /// The serialized `type` tag of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Text { .. } => "text",
            Self::Error { .. } => "error",
            Self::Complete { .. } => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Complete { .. })
    }
}
