//! Configuration loading, validation, and management for AppForge.
//!
//! Loads configuration from `~/.appforge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.appforge/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider used when a request does not name one ("openai" or "anthropic")
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Per-vendor credentials and endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Daily quota settings
    #[serde(default)]
    pub usage: UsageConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_provider() -> String {
    "openai".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on LLM turns per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Response token ceiling per turn
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Send the `run_command` definition to the model
    #[serde(default)]
    pub advertise_run_command: bool,

    /// Replaces the built-in system prompt when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_max_iterations() -> u32 {
    15
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_temperature() -> f32 {
    0.1
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            advertise_run_command: false,
            system_prompt_override: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,

    #[serde(default)]
    pub anthropic: ProviderConfig,
}

impl ProvidersConfig {
    /// Look up a vendor section by name.
    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openai" => Some(&self.openai),
            "anthropic" => Some(&self.anthropic),
            _ => None,
        }
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "openai" => Some(&mut self.openai),
            "anthropic" => Some(&mut self.anthropic),
            _ => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (proxies, compatible gateways, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model used when the request leaves it blank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            default_model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// When false the quota check is skipped entirely
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Daily request limit for users without a plan entry; 0 = unlimited
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Daily limits by plan name, e.g. `pro = 500`
    #[serde(default)]
    pub plan_limits: BTreeMap<String, u32>,

    /// Plan assignments by user id; unlisted users are on the default plan
    #[serde(default)]
    pub user_plans: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}
fn default_daily_limit() -> u32 {
    50
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_limit: default_daily_limit(),
            plan_limits: BTreeMap::new(),
            user_plans: BTreeMap::new(),
        }
    }
}

impl UsageConfig {
    /// Daily limit for a plan, falling back to `daily_limit`.
    pub fn limit_for_plan(&self, plan: &str) -> u32 {
        self.plan_limits.get(plan).copied().unwrap_or(self.daily_limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body; requests carry the whole project
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3100
}
fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.appforge/config.toml),
    /// then apply environment overrides:
    /// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY` (only when the file has none)
    /// - `APPFORGE_PROVIDER`, `APPFORGE_MODEL`, `APPFORGE_MAX_ITERATIONS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.providers.openai.api_key.is_none() {
            self.providers.openai.api_key = non_empty("OPENAI_API_KEY");
        }
        if self.providers.anthropic.api_key.is_none() {
            self.providers.anthropic.api_key = non_empty("ANTHROPIC_API_KEY");
        }

        if let Some(provider) = non_empty("APPFORGE_PROVIDER") {
            self.default_provider = provider.trim().to_lowercase();
        }

        if let Some(model) = non_empty("APPFORGE_MODEL")
            && let Some(section) = self.providers.get_mut(&self.default_provider)
        {
            section.default_model = Some(model);
        }

        if let Some(raw) = non_empty("APPFORGE_MAX_ITERATIONS") {
            self.agent.max_iterations = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "APPFORGE_MAX_ITERATIONS must be a positive integer, got '{raw}'"
                ))
            })?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".appforge")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.default_provider.as_str(), "openai" | "anthropic") {
            return Err(ConfigError::ValidationError(format!(
                "default_provider must be \"openai\" or \"anthropic\", got \"{}\"",
                self.default_provider
            )));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.agent.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tokens must be at least 1".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        for (name, section) in [("openai", &self.providers.openai), ("anthropic", &self.providers.anthropic)] {
            if section.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{name}.timeout_secs must be at least 1"
                )));
            }
        }

        for (user, plan) in &self.usage.user_plans {
            if !self.usage.plan_limits.contains_key(plan) {
                return Err(ConfigError::ValidationError(format!(
                    "usage.user_plans.{user} names plan \"{plan}\", which has no entry in usage.plan_limits"
                )));
            }
        }

        if self.gateway.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_body_bytes must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Whether the named provider has an API key configured.
    pub fn has_api_key(&self, provider: &str) -> bool {
        self.providers
            .get(provider)
            .is_some_and(|p| p.api_key.is_some())
    }

    /// Render the config as TOML with API keys replaced by a placeholder.
    pub fn redacted_toml(&self) -> String {
        let mut shown = self.clone();
        for section in [&mut shown.providers.openai, &mut shown.providers.anthropic] {
            if section.api_key.is_some() {
                section.api_key = Some("[REDACTED]".into());
            }
        }
        toml::to_string_pretty(&shown).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            agent: AgentConfig::default(),
            providers: ProvidersConfig::default(),
            usage: UsageConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.agent.max_iterations, 15);
        assert_eq!(config.agent.max_tokens, 8192);
        assert!((config.agent.temperature - 0.1).abs() < f32::EPSILON);
        assert!(!config.agent.advertise_run_command);
        assert_eq!(config.providers.anthropic.timeout_secs, 120);
        assert_eq!(config.usage.daily_limit, 50);
        assert_eq!(config.gateway.port, 3100);
        assert_eq!(config.gateway.max_body_bytes, 10 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.agent.max_iterations, config.agent.max_iterations);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
default_provider = "anthropic"

[agent]
max_iterations = 5

[providers.anthropic]
api_key = "sk-ant-test"
api_url = "http://localhost:9000"

[usage]
daily_limit = 10

[usage.plan_limits]
pro = 500

[usage.user_plans]
alice = "pro"

[gateway]
max_body_bytes = 2048
"#
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_provider, "anthropic");
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.max_tokens, 8192);
        assert_eq!(config.providers.anthropic.api_url.as_deref(), Some("http://localhost:9000"));
        assert!(config.has_api_key("anthropic"));
        assert!(!config.has_api_key("openai"));
        assert_eq!(config.usage.limit_for_plan("pro"), 500);
        assert_eq!(config.usage.limit_for_plan("free"), 10);
        assert_eq!(config.usage.user_plans["alice"], "pro");
        assert_eq!(config.gateway.max_body_bytes, 2048);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\nmax_iterations = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.agent.temperature = 5.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());

        let config = AppConfig {
            default_provider: "openrouter".into(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn user_plans_must_name_a_known_plan() {
        let mut config = AppConfig::default();
        config.usage.user_plans.insert("bob".into(), "enterprise".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("usage.user_plans.bob"));

        config.usage.plan_limits.insert("enterprise".into(), 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_body_limit_rejected() {
        let mut config = AppConfig::default();
        config.gateway.max_body_bytes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("OPENAI_API_KEY", "sk-openai"),
                ("ANTHROPIC_API_KEY", "sk-ant"),
                ("APPFORGE_PROVIDER", "Anthropic"),
                ("APPFORGE_MODEL", "claude-opus-4-1"),
                ("APPFORGE_MAX_ITERATIONS", "3"),
            ]))
            .unwrap();

        assert_eq!(config.default_provider, "anthropic");
        assert_eq!(config.providers.openai.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.providers.anthropic.default_model.as_deref(), Some("claude-opus-4-1"));
        assert!(config.providers.openai.default_model.is_none());
        assert_eq!(config.agent.max_iterations, 3);
    }

    #[test]
    fn env_does_not_replace_file_keys() {
        let mut config = AppConfig::default();
        config.providers.openai.api_key = Some("from-file".into());
        config.apply_env(env(&[("OPENAI_API_KEY", "from-env")])).unwrap();
        assert_eq!(config.providers.openai.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn bad_env_iterations_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("APPFORGE_MAX_ITERATIONS", "lots")])).is_err());
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("APPFORGE_MAX_ITERATIONS", "0")])).is_err());
    }

    #[test]
    fn debug_and_toml_redact_keys() {
        let mut config = AppConfig::default();
        config.providers.openai.api_key = Some("sk-secret-123".into());
        assert!(!format!("{config:?}").contains("sk-secret-123"));

        let shown = config.redacted_toml();
        assert!(!shown.contains("sk-secret-123"));
        assert!(shown.contains("[REDACTED]"));
    }
}
