//! write_file: create or replace a file.

use appforge_core::error::ToolError;
use appforge_core::files::{VirtualFileMap, WriteOutcome, normalize_path};
use appforge_core::tool::{Tool, ToolResult, required_non_empty, required_str};

pub struct WriteFileTool;

impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create a new file or overwrite an existing one with the given content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the file to write, e.g. \"server.js\" or \"public/style.css\""
                },
                "content": {
                    "type": "string",
                    "description": "The full new content of the file"
                }
            },
            "required": ["path", "content"]
        })
    }

    fn execute(
        &self,
        arguments: &serde_json::Value,
        files: &mut VirtualFileMap,
    ) -> Result<ToolResult, ToolError> {
        let path = required_non_empty(arguments, "path")?;
        let content = required_str(arguments, "content")?;

        let path = normalize_path(path);
        let verb = match files.write(&path, content)? {
            WriteOutcome::Created => "Created",
            WriteOutcome::Updated => "Updated",
        };
        Ok(ToolResult::ok_with_changes(
            format!("{verb} file: {path}"),
            vec![path],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_update() {
        let mut files = VirtualFileMap::new();
        let args = serde_json::json!({"path": "app.js", "content": "let a = 1;"});

        let first = WriteFileTool.execute(&args, &mut files).unwrap();
        assert_eq!(first.result.as_deref(), Some("Created file: app.js"));
        assert_eq!(first.files_changed, Some(vec!["app.js".to_string()]));

        let second = WriteFileTool.execute(&args, &mut files).unwrap();
        assert_eq!(second.result.as_deref(), Some("Updated file: app.js"));
        assert_eq!(files.read("app.js").unwrap(), "let a = 1;");
    }

    #[test]
    fn reports_normalized_path() {
        let mut files = VirtualFileMap::new();
        let result = WriteFileTool
            .execute(&serde_json::json!({"path": "/public/app.js", "content": ""}), &mut files)
            .unwrap();
        assert_eq!(result.result.as_deref(), Some("Created file: public/app.js"));
        assert_eq!(files.read("public/app.js").unwrap(), "");
    }

    #[test]
    fn missing_content_is_rejected() {
        let mut files = VirtualFileMap::new();
        let err = WriteFileTool
            .execute(&serde_json::json!({"path": "a.js"}), &mut files)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: content");
        assert!(files.is_empty());
    }

    #[test]
    fn missing_path_is_rejected() {
        let mut files = VirtualFileMap::new();
        let err = WriteFileTool
            .execute(&serde_json::json!({"content": "x"}), &mut files)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: path");
    }
}
