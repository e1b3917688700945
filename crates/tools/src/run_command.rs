//! run_command: a pseudo-tool executed by the browser sandbox, not here.
//!
//! It is never registered. The agent loop may advertise its definition and
//! answers every call with [`run_command_ack`].

use appforge_core::provider::ToolDefinition;
use appforge_core::tool::ToolResult;

pub const RUN_COMMAND: &str = "run_command";

pub const RUN_COMMAND_ACK: &str =
    "Command execution is handled client-side. The command will be queued for execution.";

/// The definition sent to the model when command execution is advertised.
pub fn run_command_definition() -> ToolDefinition {
    ToolDefinition {
        name: RUN_COMMAND.into(),
        description: "Queue a shell command (e.g. \"npm install\") to run in the preview sandbox.".into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command line to run"
                }
            },
            "required": ["command"]
        }),
    }
}

/// The canned result returned for every run_command call.
pub fn run_command_ack() -> ToolResult {
    ToolResult::ok(RUN_COMMAND_ACK)
}
