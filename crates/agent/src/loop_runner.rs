//! The agent reasoning loop implementation.
//!
//! A run moves through an explicit state machine:
//!
//! ```text
//! Initializing -> Iterating(0) -> Iterating(1) -> ... -> Completing -> Done
//!                      \                                  ^
//!                       +-> Erroring -> Done              |
//!                       +-> (no tool calls / task_complete / cap reached)
//! ```
//!
//! [`AgentLoop::step`] is the only transition function. Every provider call
//! happens in `Iterating`, every event is appended as a side effect of a
//! transition, and the file map is only touched through the tool registry.

use crate::prompts;
use appforge_core::error::ProviderError;
use appforge_core::event::AgentEvent;
use appforge_core::files::VirtualFileMap;
use appforge_core::message::{Conversation, Message, MessageToolCall};
use appforge_core::provider::{Provider, ProviderRequest, ToolDefinition, Usage};
use appforge_core::tool::{ToolCall, ToolRegistry, ToolResult};
use appforge_tools::{RUN_COMMAND, TASK_COMPLETE, run_command_ack, run_command_definition};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ITERATIONS: u32 = 15;
pub const DEFAULT_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Where a run is in its lifecycle.
#[derive(Debug)]
pub enum RunState {
    /// Conversation not yet seeded.
    Initializing,
    /// About to make LLM call number `n` (0-based).
    Iterating(u32),
    /// Finishing normally; carries the `task_complete` summary if any.
    Completing { summary: Option<String> },
    /// A provider call failed.
    Erroring(ProviderError),
    Done,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Ended with a `complete` event.
    Completed,
    /// Ended with an `error` event.
    Failed,
}

/// Everything a finished run hands back to the caller.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub run_id: String,
    /// Append-only transcript, in emission order
    pub events: Vec<AgentEvent>,
    /// The file map after every executed tool call
    pub files: VirtualFileMap,
    pub summary: Option<String>,
    pub outcome: RunOutcome,
    /// Number of provider calls made
    pub iterations: u32,
    /// Provider-reported token usage summed over all calls
    pub usage: Usage,
}

/// Mutable state owned by one run.
struct RunContext {
    run_id: String,
    message: String,
    conversation: Conversation,
    files: VirtualFileMap,
    events: Vec<AgentEvent>,
    summary: Option<String>,
    outcome: RunOutcome,
    iterations: u32,
    usage: Usage,
}

impl RunContext {
    fn new(message: &str, files: VirtualFileMap) -> Self {
        let conversation = Conversation::new();
        Self {
            run_id: conversation.id.to_string(),
            message: message.to_string(),
            conversation,
            files,
            events: Vec::new(),
            summary: None,
            outcome: RunOutcome::Failed,
            iterations: 0,
            usage: Usage::default(),
        }
    }

    fn finish(self) -> AgentRun {
        AgentRun {
            run_id: self.run_id,
            events: self.events,
            files: self.files,
            summary: self.summary,
            outcome: self.outcome,
            iterations: self.iterations,
            usage: self.usage,
        }
    }
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per response
    max_tokens: u32,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Replaces the built-in system prompt when set
    system_prompt: Option<String>,

    /// Upper bound on provider calls per run
    max_iterations: u32,

    /// Whether `run_command` is offered to the model
    advertise_run_command: bool,
}

impl AgentLoop {
    /// Create a new agent loop with default limits.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            tools,
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            advertise_run_command: false,
        }
    }

    /// Set the maximum number of LLM calls per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Use a custom system prompt instead of the built-in one.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Offer the `run_command` pseudo-tool to the model.
    pub fn with_run_command(mut self, advertise: bool) -> Self {
        self.advertise_run_command = advertise;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Tool definitions sent with every request, in registry order.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.tools.definitions();
        if self.advertise_run_command {
            definitions.push(run_command_definition());
        }
        definitions
    }

    fn system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| prompts::system_prompt(self.advertise_run_command))
    }

    /// Run one request to completion.
    ///
    /// Never fails: provider errors end the run with an `error` event, and
    /// the files mutated so far are returned either way.
    pub async fn run(&self, message: &str, files: VirtualFileMap) -> AgentRun {
        let mut ctx = RunContext::new(message, files);
        info!(
            run_id = %ctx.run_id,
            provider = self.provider.name(),
            model = %self.model,
            files = ctx.files.len(),
            "Starting agent run"
        );

        let mut state = RunState::Initializing;
        while !matches!(state, RunState::Done) {
            state = self.step(state, &mut ctx).await;
        }

        info!(
            run_id = %ctx.run_id,
            outcome = ?ctx.outcome,
            iterations = ctx.iterations,
            events = ctx.events.len(),
            total_tokens = ctx.usage.total_tokens,
            "Agent run finished"
        );
        ctx.finish()
    }

    /// The transition function.
    async fn step(&self, state: RunState, ctx: &mut RunContext) -> RunState {
        match state {
            RunState::Initializing => {
                ctx.conversation.push(Message::system(self.system_prompt()));
                ctx.conversation
                    .push(Message::user(prompts::initial_user_message(&ctx.message, &ctx.files)));
                RunState::Iterating(0)
            }

            RunState::Iterating(n) if n >= self.max_iterations => {
                warn!(
                    run_id = %ctx.run_id,
                    iterations = n,
                    "Max iterations reached without task_complete"
                );
                RunState::Completing { summary: None }
            }

            RunState::Iterating(n) => self.iterate(n, ctx).await,

            RunState::Completing { summary } => {
                debug!(run_id = %ctx.run_id, summary = ?summary, "Completing");
                ctx.events.push(AgentEvent::Complete {
                    files: ctx.files.clone().into_inner(),
                    summary: summary.clone(),
                });
                ctx.summary = summary;
                ctx.outcome = RunOutcome::Completed;
                RunState::Done
            }

            RunState::Erroring(error) => {
                warn!(run_id = %ctx.run_id, error = %error, "Provider call failed, ending run");
                ctx.events.push(AgentEvent::Error {
                    message: error.to_string(),
                });
                ctx.outcome = RunOutcome::Failed;
                RunState::Done
            }

            RunState::Done => RunState::Done,
        }
    }

    /// One LLM call plus the tool calls it requested.
    async fn iterate(&self, n: u32, ctx: &mut RunContext) -> RunState {
        debug_assert!(ctx.conversation.pending_tool_calls().is_empty());
        debug!(run_id = %ctx.run_id, iteration = n, "Agent loop iteration");

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: ctx.conversation.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tool_definitions(),
        };

        ctx.iterations = n + 1;
        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => return RunState::Erroring(e),
        };
        if let Some(usage) = response.usage {
            ctx.usage += usage;
        }

        let message = response.message;
        if !message.content.is_empty() {
            ctx.events.push(AgentEvent::Text {
                content: message.content.clone(),
            });
        }

        if message.tool_calls.is_empty() {
            debug!(run_id = %ctx.run_id, iteration = n, "No tool calls, finishing");
            ctx.conversation.push(message);
            return RunState::Completing { summary: None };
        }

        let calls = message.tool_calls.clone();
        ctx.conversation.push(message);

        let mut finished = false;
        let mut summary = None;
        let mut results = Vec::with_capacity(calls.len());

        for tc in &calls {
            ctx.events.push(AgentEvent::ToolCall {
                tool: tc.name.clone(),
                arguments: tc.arguments.clone(),
            });

            let result = self.execute_tool(tc, &mut ctx.files);
            debug!(
                run_id = %ctx.run_id,
                iteration = n,
                tool = %tc.name,
                success = result.success,
                "Tool executed"
            );

            if tc.name == TASK_COMPLETE {
                finished = true;
                summary = tc.arguments["summary"].as_str().map(String::from);
            }

            ctx.events.push(AgentEvent::ToolResult {
                tool: tc.name.clone(),
                result: result.clone(),
            });
            results.push((tc.id.clone(), result));
        }

        let context = prompts::files_context(&ctx.files);
        for (call_id, result) in results {
            let encoded = serde_json::to_string(&result).unwrap_or_default();
            ctx.conversation
                .push(Message::tool_result(call_id, format!("{encoded}\n\n[{context}]")));
        }

        if finished {
            RunState::Completing { summary }
        } else {
            RunState::Iterating(n + 1)
        }
    }

    fn execute_tool(&self, tc: &MessageToolCall, files: &mut VirtualFileMap) -> ToolResult {
        if tc.name == RUN_COMMAND {
            return run_command_ack();
        }
        let call = ToolCall {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: tc.arguments.clone(),
        };
        self.tools.dispatch(&call, files)
    }
}
