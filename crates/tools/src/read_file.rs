//! read_file: return a file's full content.

use appforge_core::error::ToolError;
use appforge_core::files::VirtualFileMap;
use appforge_core::tool::{Tool, ToolResult, required_non_empty};

pub struct ReadFileTool;

impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a project file. Always read a file before editing it so your changes fit the existing code."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the file to read, e.g. \"index.html\" or \"routes/api.js\""
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
        let path = required_non_empty(arguments, "path")?;
        match files.read(path) {
            Ok(content) => Ok(ToolResult::ok(content)),
            Err(ToolError::FileNotFound(missing)) => {
                let available = match files.paths() {
                    paths if paths.is_empty() => "none".to_string(),
                    paths => paths.join(", "),
                };
                Err(ToolError::FileNotFound(format!(
                    "{missing}. Available files: {available}"
                )))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition() {
        let schema = ReadFileTool.parameters_schema();
        assert_eq!(ReadFileTool.name(), "read_file");
        assert_eq!(schema["required"], serde_json::json!(["path"]));
        assert!(schema["properties"]["path"].is_object());
    }

    #[test]
    fn reads_existing_file() {
        let mut files: VirtualFileMap = [("index.html", "<h1>Hi</h1>")].into_iter().collect();
        let result = ReadFileTool
            .execute(&serde_json::json!({"path": "./index.html"}), &mut files)
            .unwrap();
        assert!(result.success);
        assert_eq!(result.result.as_deref(), Some("<h1>Hi</h1>"));
        assert!(result.files_changed.is_none());
    }

    #[test]
    fn missing_file_lists_available() {
        let mut files: VirtualFileMap = [("b.js", ""), ("a.js", "")].into_iter().collect();
        let err = ReadFileTool
            .execute(&serde_json::json!({"path": "c.js"}), &mut files)
            .unwrap_err();
        assert_eq!(err.to_string(), "File not found: c.js. Available files: a.js, b.js");
    }

    #[test]
    fn missing_file_in_empty_project() {
        let mut files = VirtualFileMap::new();
        let err = ReadFileTool
            .execute(&serde_json::json!({"path": "c.js"}), &mut files)
            .unwrap_err();
        assert_eq!(err.to_string(), "File not found: c.js. Available files: none");
    }

    #[test]
    fn blank_path_is_missing() {
        let mut files = VirtualFileMap::new();
        let err = ReadFileTool
            .execute(&serde_json::json!({"path": "  "}), &mut files)
            .unwrap_err();
        assert_eq!(err, ToolError::MissingParameter("path".into()));
    }
}
