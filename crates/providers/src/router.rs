//! Provider router: picks the vendor adapter and model for a request.

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;
use appforge_core::error::ProviderError;
use appforge_core::provider::Provider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// The two supported vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    /// Parse a vendor name. Anything other than "anthropic" selects OpenAI.
    pub fn parse(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("anthropic") {
            Self::Anthropic
        } else {
            Self::OpenAi
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Model used when neither the request nor the config names one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    /// Environment variable holding this vendor's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<ProviderKind, Arc<dyn Provider>>,
    models: HashMap<ProviderKind, String>,
    default_kind: ProviderKind,
}

impl ProviderRouter {
    /// Create an empty router.
    pub fn new(default_kind: ProviderKind) -> Self {
        Self {
            providers: HashMap::new(),
            models: HashMap::new(),
            default_kind,
        }
    }

    /// Register a provider.
    pub fn register(&mut self, kind: ProviderKind, provider: Arc<dyn Provider>) {
        self.providers.insert(kind, provider);
    }

    /// Override the fallback model for a vendor.
    pub fn set_default_model(&mut self, kind: ProviderKind, model: impl Into<String>) {
        self.models.insert(kind, model.into());
    }

    pub fn default_kind(&self) -> ProviderKind {
        self.default_kind
    }

    /// Get the provider for a vendor.
    ///
    /// Fails with `NotConfigured` when no API key was supplied for it.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| ProviderError::NotConfigured(format!("{} not configured", kind.api_key_env())))
    }

    /// The model to use: the request's if non-blank, else the configured
    /// default, else the vendor default.
    pub fn resolve_model(&self, kind: ProviderKind, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .or_else(|| self.models.get(&kind).cloned())
            .unwrap_or_else(|| kind.default_model().to_string())
    }

    /// List all configured vendors.
    pub fn list(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.providers.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

/// Build providers from configuration.
///
/// A vendor is registered only when it has an API key.
pub fn build_from_config(config: &appforge_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(ProviderKind::parse(&config.default_provider));

    for kind in [ProviderKind::OpenAi, ProviderKind::Anthropic] {
        let Some(section) = config.providers.get(kind.as_str()) else {
            continue;
        };

        if let Some(model) = &section.default_model {
            router.set_default_model(kind, model.clone());
        }

        let Some(api_key) = section.api_key.as_deref().filter(|k| !k.is_empty()) else {
            continue;
        };

        let provider: Arc<dyn Provider> = match kind {
            ProviderKind::OpenAi => {
                let mut p = OpenAiProvider::new(api_key).with_timeout(section.timeout_secs);
                if let Some(url) = &section.api_url {
                    p = p.with_base_url(url);
                }
                Arc::new(p)
            }
            ProviderKind::Anthropic => {
                let mut p = AnthropicProvider::new(api_key).with_timeout(section.timeout_secs);
                if let Some(url) = &section.api_url {
                    p = p.with_base_url(url);
                }
                Arc::new(p)
            }
        };

        router.register(kind, provider);
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_config::AppConfig;

    #[test]
    fn kind_parsing_falls_back_to_openai() {
        assert_eq!(ProviderKind::parse("anthropic"), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::parse(" Anthropic "), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::parse("openai"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse("mistral"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse(""), ProviderKind::OpenAi);
    }

    #[test]
    fn kind_serde_names() {
        assert_eq!(serde_json::to_string(&ProviderKind::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&ProviderKind::Anthropic).unwrap(), "\"anthropic\"");
    }

    #[test]
    fn build_registers_only_keyed_providers() {
        let mut config = AppConfig::default();
        config.providers.anthropic.api_key = Some("sk-ant".into());
        let router = build_from_config(&config);

        assert_eq!(router.list(), vec![ProviderKind::Anthropic]);
        assert!(router.get(ProviderKind::Anthropic).is_ok());
        let err = router.get(ProviderKind::OpenAi).err().unwrap();
        assert_eq!(err.to_string(), "Provider not configured: OPENAI_API_KEY not configured");
    }

    #[test]
    fn model_resolution_order() {
        let mut config = AppConfig::default();
        config.providers.openai.default_model = Some("gpt-4.1".into());
        let router = build_from_config(&config);

        assert_eq!(router.resolve_model(ProviderKind::OpenAi, Some("o3")), "o3");
        assert_eq!(router.resolve_model(ProviderKind::OpenAi, Some("  ")), "gpt-4.1");
        assert_eq!(router.resolve_model(ProviderKind::OpenAi, None), "gpt-4.1");
        assert_eq!(
            router.resolve_model(ProviderKind::Anthropic, None),
            "claude-sonnet-4-20250514"
        );
    }
}
