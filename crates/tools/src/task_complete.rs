//! task_complete: the model's signal that the request is done.
//!
//! Executing it changes nothing. The agent loop watches for this name and
//! stops after the current turn.

use appforge_core::error::ToolError;
use appforge_core::files::VirtualFileMap;
use appforge_core::tool::{Tool, ToolResult};

/// Name the agent loop treats as its termination sentinel.
pub const TASK_COMPLETE: &str = "task_complete";

pub struct TaskCompleteTool;

impl TaskCompleteTool {
    /// Split a comma-separated `files_changed` argument.
    pub fn parse_files_changed(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

impl Tool for TaskCompleteTool {
    fn name(&self) -> &str {
        TASK_COMPLETE
    }

    fn description(&self) -> &str {
        "Call this once the user's request is fully implemented, with a short summary of what you did."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "One or two sentences describing the changes"
                },
                "files_changed": {
                    "type": "string",
                    "description": "Comma-separated paths that were created, modified, or deleted"
                }
            },
            "required": ["summary"]
        })
    }

    fn execute(
        &self,
        arguments: &serde_json::Value,
        _files: &mut VirtualFileMap,
    ) -> Result<ToolResult, ToolError> {
        let summary = arguments["summary"].as_str().unwrap_or_default();
        let result = ToolResult::ok(format!("Task completed: {summary}"));
        Ok(ToolResult {
            files_changed: arguments["files_changed"].as_str().map(Self::parse_files_changed),
            ..result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_summary_and_changes() {
        let mut files = VirtualFileMap::new();
        let result = TaskCompleteTool
            .execute(
                &serde_json::json!({"summary": "Built a todo app", "files_changed": "index.html, app.js,, "}),
                &mut files,
            )
            .unwrap();
        assert_eq!(result.result.as_deref(), Some("Task completed: Built a todo app"));
        assert_eq!(
            result.files_changed,
            Some(vec!["index.html".to_string(), "app.js".to_string()])
        );
    }

    #[test]
    fn never_fails() {
        let mut files = VirtualFileMap::new();
        let result = TaskCompleteTool.execute(&serde_json::json!({}), &mut files).unwrap();
        assert!(result.success);
        assert_eq!(result.result.as_deref(), Some("Task completed: "));
        assert!(result.files_changed.is_none());
    }
}
