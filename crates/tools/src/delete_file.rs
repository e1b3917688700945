//! delete_file: remove a file from the project.

use appforge_core::error::ToolError;
use appforge_core::files::{VirtualFileMap, normalize_path};
use appforge_core::tool::{Tool, ToolResult, required_non_empty};

pub struct DeleteFileTool;

impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Remove a file from the project. This cannot be undone."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the file to remove"
                }
            },
            "required": ["path"]
        })
    }

    fn execute(
        &self,
        arguments: &serde_json::Value,
        files: &mut VirtualFileMap,
    ) -> Result<ToolResult, ToolError> {
        let path = normalize_path(required_non_empty(arguments, "path")?);
        files.delete(&path)?;
        Ok(ToolResult::ok_with_changes(
            format!("Deleted file: {path}"),
            vec![path],
        ))
    }
}
