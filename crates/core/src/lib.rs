//! # AppForge Core
//!
//! Domain types, traits, and error definitions for the AppForge coding agent.
//! This crate has **zero framework dependencies**. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator the agent loop talks to is defined as a trait here:
//! - [`Provider`] for LLM backends (OpenAI, Anthropic)
//! - [`Tool`] for operations over the virtual file store
//! - [`UsageStore`] for per-user quota persistence
//!
//! Implementations live in their respective crates, so the loop can be
//! tested against scripted providers and in-memory stores.

pub mod error;
pub mod event;
pub mod files;
pub mod message;
pub mod provider;
pub mod tool;
pub mod usage;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::AgentEvent;
pub use files::{SearchReport, VirtualFileMap, WriteOutcome};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
pub use usage::{UsageSnapshot, UsageStore};
