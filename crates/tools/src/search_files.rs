//! search_files: case-insensitive line search across the project.

use appforge_core::error::ToolError;
use appforge_core::files::VirtualFileMap;
use appforge_core::tool::{Tool, ToolResult, optional_str, required_non_empty};
use tracing::debug;

pub struct SearchFilesTool;

impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Find lines matching a text or regex pattern across project files, e.g. to locate a function, import, or element id."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text or regular expression to look for (case-insensitive)"
                },
                "file_pattern": {
                    "type": "string",
                    "description": "Optional glob limiting which files are searched, e.g. \"*.js\" or \"public/*.html\""
                }
            },
            "required": ["query"]
        })
    }

    fn execute(
        &self,
        arguments: &serde_json::Value,
        files: &mut VirtualFileMap,
    ) -> Result<ToolResult, ToolError> {
        let query = required_non_empty(arguments, "query")?;
        let pattern = optional_str(arguments, "file_pattern");

        let report = files.search(query, pattern);
        debug!(
            query,
            pattern,
            files = report.files.len(),
            matches = report.total_matches,
            "Searched files"
        );
        Ok(ToolResult::ok(report.render(query)))
    }
}
