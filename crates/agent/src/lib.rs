//! The AppForge coding agent.
//!
//! One request runs a bounded tool-use loop against an LLM:
//!
//! 1. **Seed** the conversation with the system prompt and the request plus a
//!    listing of the project's paths
//! 2. **Call** the provider with the file tools attached
//! 3. **Dispatch** every requested tool call against the in-memory file map,
//!    feeding each result back to the model
//! 4. **Stop** on `task_complete`, a text-only reply, a provider error, or
//!    the iteration cap
//!
//! Every step is recorded as an [`AgentEvent`](appforge_core::AgentEvent).

pub mod loop_runner;
pub mod prompts;
pub mod service;

pub use loop_runner::{AgentLoop, AgentRun, RunOutcome, RunState};
pub use service::{AgentError, AgentRequest, AgentResponse, AgentService};
