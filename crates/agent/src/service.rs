//! Request-level entry point: validation, quota, provider selection, run.

use crate::loop_runner::{AgentLoop, AgentRun};
use appforge_config::{AgentConfig, AppConfig};
use appforge_core::error::ProviderError;
use appforge_core::event::AgentEvent;
use appforge_core::files::VirtualFileMap;
use appforge_core::provider::ToolDefinition;
use appforge_core::usage::UsageSnapshot;
use appforge_providers::{ProviderKind, ProviderRouter};
use appforge_usage::{InMemoryUsageStore, QuotaExceeded, UsageGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One agent request as sent by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub message: String,

    #[serde(default)]
    pub current_files: VirtualFileMap,

    /// "openai" or "anthropic"; the configured default when absent
    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default)]
    pub model: Option<String>,
}

impl AgentRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_files(mut self, files: VirtualFileMap) -> Self {
        self.current_files = files;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// The finished transcript and file set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub events: Vec<AgentEvent>,
    pub files: VirtualFileMap,
    pub is_fullstack: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl From<AgentRun> for AgentResponse {
    fn from(run: AgentRun) -> Self {
        Self {
            is_fullstack: run.files.is_fullstack(),
            events: run.events,
            files: run.files,
            summary: run.summary,
        }
    }
}

/// Failures that stop a request before the loop starts.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    QuotaExceeded(#[from] QuotaExceeded),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Ties the provider router, tool registry, and usage guard together.
pub struct AgentService {
    router: ProviderRouter,
    tools: Arc<appforge_core::tool::ToolRegistry>,
    guard: UsageGuard,
    config: AgentConfig,
}

impl AgentService {
    pub fn new(
        router: ProviderRouter,
        tools: Arc<appforge_core::tool::ToolRegistry>,
        guard: UsageGuard,
        config: AgentConfig,
    ) -> Self {
        Self {
            router,
            tools,
            guard,
            config,
        }
    }

    /// Build the service with the default tools and an in-memory usage store.
    pub fn from_config(config: &AppConfig) -> Self {
        let guard = if config.usage.enabled {
            UsageGuard::new(Arc::new(InMemoryUsageStore::from_config(&config.usage)))
        } else {
            UsageGuard::disabled()
        };

        Self::new(
            appforge_providers::build_from_config(config),
            Arc::new(appforge_tools::default_registry()),
            guard,
            config.agent.clone(),
        )
    }

    pub fn router(&self) -> &ProviderRouter {
        &self.router
    }

    /// Every tool definition the model may be offered.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.tools.definitions();
        if self.config.advertise_run_command {
            definitions.push(appforge_tools::run_command_definition());
        }
        definitions
    }

    pub async fn usage(&self, user_id: &str) -> Option<UsageSnapshot> {
        self.guard.usage(user_id).await
    }

    /// Handle one request for `user_id`.
    ///
    /// Stale daily counters are cleared, then quota is checked before the
    /// provider is resolved, so an exhausted user gets a quota error even
    /// when no API key is configured.
    pub async fn handle(&self, user_id: &str, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AgentError::InvalidRequest("Message is required".into()));
        }

        self.guard.reset_daily().await;
        self.guard.check_quota(user_id).await?;

        let kind = request
            .provider
            .as_deref()
            .map(ProviderKind::parse)
            .unwrap_or_else(|| self.router.default_kind());
        let provider = self.router.get(kind)?;
        let model = self.router.resolve_model(kind, request.model.as_deref());

        info!(user_id, provider = %kind, model = %model, "Handling agent request");

        let mut agent = AgentLoop::new(provider, model, self.tools.clone())
            .with_max_iterations(self.config.max_iterations)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_run_command(self.config.advertise_run_command);
        if let Some(prompt) = &self.config.system_prompt_override {
            agent = agent.with_system_prompt(prompt.clone());
        }

        let run = agent.run(message, request.current_files).await;
        if run.outcome == crate::RunOutcome::Failed {
            warn!(user_id, run_id = %run.run_id, "Agent run ended with an error");
        }

        self.guard.record_usage(user_id).await;
        Ok(run.into())
    }
}
