//! Built-in tool implementations for AppForge.
//!
//! Tools give the agent its only way to touch a project: read, write, list,
//! search, and delete files in the in-memory file map, plus the
//! `task_complete` sentinel that ends a run.

pub mod delete_file;
pub mod list_files;
pub mod read_file;
pub mod run_command;
pub mod search_files;
pub mod task_complete;
pub mod write_file;

use appforge_core::tool::ToolRegistry;

pub use run_command::{RUN_COMMAND, RUN_COMMAND_ACK, run_command_ack, run_command_definition};
pub use task_complete::TASK_COMPLETE;

/// Create a registry with the six file tools, in the order they are
/// advertised to the model.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(read_file::ReadFileTool));
    registry.register(Box::new(write_file::WriteFileTool));
    registry.register(Box::new(list_files::ListFilesTool));
    registry.register(Box::new(search_files::SearchFilesTool));
    registry.register(Box::new(delete_file::DeleteFileTool));
    registry.register(Box::new(task_complete::TaskCompleteTool));
    registry
}
