//! list_files: indentation tree of every path in the project.

use appforge_core::error::ToolError;
use appforge_core::files::VirtualFileMap;
use appforge_core::tool::{Tool, ToolResult};

pub struct ListFilesTool;

impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "Show every file in the project as a tree."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    fn execute(
        &self,
        _arguments: &serde_json::Value,
        files: &mut VirtualFileMap,
    ) -> Result<ToolResult, ToolError> {
        if files.is_empty() {
            return Ok(ToolResult::ok("No files in project."));
        }
        Ok(ToolResult::ok(files.tree()))
    }
}
