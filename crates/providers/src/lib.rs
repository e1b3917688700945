//! LLM Provider implementations for AppForge.
//!
//! Both vendors implement the `appforge_core::Provider` trait and render the
//! neutral conversation into their own wire format. The router selects the
//! adapter and model for a request from configuration.

pub mod anthropic;
mod http;
pub mod openai;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use router::{ProviderKind, ProviderRouter, build_from_config};
