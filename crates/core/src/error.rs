//! Error types for the AppForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for all AppForge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Usage tracking errors ---
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to an LLM vendor. Always fatal to a run.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The vendor answered with a non-2xx status. `message` is the vendor's
    /// `error.message` when the body carried one.
    #[error("{message}")]
    Api { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    /// The body arrived but did not have the expected shape.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Failures inside a single tool execution.
///
/// These never leave the dispatcher: [`crate::tool::ToolRegistry::dispatch`]
/// renders them into a failed [`crate::tool::ToolResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures from the usage persistence backend.
#[derive(Debug, Clone, Error)]
pub enum UsageError {
    #[error("Usage backend unavailable: {0}")]
    Unavailable(String),

    #[error("No usage record for user {0}")]
    UnknownUser(String),
}
