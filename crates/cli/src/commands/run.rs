//! `appforge run`: run one agent request against a local file set.

use std::path::{Path, PathBuf};

use appforge_agent::{AgentRequest, AgentService};
use appforge_config::AppConfig;
use appforge_core::event::AgentEvent;
use appforge_core::files::VirtualFileMap;

pub struct RunArgs {
    pub message: String,
    pub files: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub out: Option<PathBuf>,
    pub user: String,
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let files = match &args.files {
        Some(path) => load_files(path)?,
        None => VirtualFileMap::new(),
    };

    let mut request = AgentRequest::new(args.message).with_files(files);
    if let Some(provider) = args.provider {
        request = request.with_provider(provider);
    }
    if let Some(model) = args.model {
        request = request.with_model(model);
    }

    let service = AgentService::from_config(&config);
    let response = service.handle(&args.user, request).await?;

    for event in &response.events {
        println!("{}", render_event(event));
    }

    println!();
    match &response.summary {
        Some(summary) if !summary.is_empty() => println!("Summary: {summary}"),
        _ => println!("Summary: (none)"),
    }
    println!(
        "Files:   {}{}",
        response.files.len(),
        if response.is_fullstack { " (fullstack)" } else { "" }
    );

    if let Some(out) = &args.out {
        std::fs::write(out, serde_json::to_string_pretty(&response.files)?)
            .map_err(|e| format!("Failed to write {}: {e}", out.display()))?;
        println!("Wrote:   {}", out.display());
    }

    Ok(())
}

fn load_files(path: &Path) -> Result<VirtualFileMap, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let files: VirtualFileMap = serde_json::from_str(&raw)
        .map_err(|e| format!("{} must be a JSON object of path -> content: {e}", path.display()))?;
    Ok(files)
}

/// One transcript line per event.
fn render_event(event: &AgentEvent) -> String {
    match event {
        AgentEvent::Text { content } => content.clone(),
        AgentEvent::ToolCall { tool, arguments } => {
            let path = arguments["path"].as_str().or_else(|| arguments["query"].as_str());
            match path {
                Some(target) => format!("  > {tool} {target}"),
                None => format!("  > {tool}"),
            }
        }
        AgentEvent::ToolResult { result, .. } => {
            if result.success {
                let text = result.result.as_deref().unwrap_or_default();
                format!("    ok: {}", text.lines().next().unwrap_or_default())
            } else {
                format!("    failed: {}", result.error.as_deref().unwrap_or("unknown error"))
            }
        }
        AgentEvent::Error { message } => format!("Error: {message}"),
        AgentEvent::Complete { files, .. } => format!("Complete ({} files)", files.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_core::tool::ToolResult;

    #[test]
    fn tool_lines_show_target() {
        let event = AgentEvent::ToolCall {
            tool: "write_file".into(),
            arguments: serde_json::json!({"path": "index.html", "content": "<p>long</p>"}),
        };
        assert_eq!(render_event(&event), "  > write_file index.html");

        let event = AgentEvent::ToolCall {
            tool: "list_files".into(),
            arguments: serde_json::json!({}),
        };
        assert_eq!(render_event(&event), "  > list_files");
    }

    #[test]
    fn results_show_first_line_or_error() {
        let ok = AgentEvent::ToolResult {
            tool: "list_files".into(),
            result: ToolResult::ok("index.html\nstyle.css"),
        };
        assert_eq!(render_event(&ok), "    ok: index.html");

        let failed = AgentEvent::ToolResult {
            tool: "read_file".into(),
            result: ToolResult::failure("File not found: a.js"),
        };
        assert_eq!(render_event(&failed), "    failed: File not found: a.js");
    }

    #[test]
    fn load_files_reads_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.json");
        std::fs::write(&path, r#"{"index.html": "<h1>x</h1>", "./app.js": ""}"#).unwrap();

        let files = load_files(&path).unwrap();
        assert_eq!(files.paths(), vec!["app.js", "index.html"]);

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(load_files(&path).is_err());
    }
}
