//! `appforge config`: configuration management commands.

use appforge_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   warning: {w}");
                }
            }

            println!();
            println!("   Provider:    {}", config.default_provider);
            println!("   Iterations:  {}", config.agent.max_iterations);
            println!("   Max tokens:  {}", config.agent.max_tokens);
            println!("   Gateway:     {}:{}", config.gateway.host, config.gateway.port);
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.redacted_toml());
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.has_api_key(&config.default_provider) {
        let var = match config.default_provider.as_str() {
            "anthropic" => "ANTHROPIC_API_KEY",
            _ => "OPENAI_API_KEY",
        };
        warnings.push(format!(
            "No API key for default provider '{}' (set {var})",
            config.default_provider
        ));
    }

    if config.gateway.host == "0.0.0.0" {
        warnings.push("Gateway bound to 0.0.0.0; x-user-id must be set by a trusted proxy".into());
    }

    if config.usage.enabled && config.usage.daily_limit == 0 {
        warnings.push("usage.daily_limit is 0, so requests are unlimited".into());
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains("config.toml"));
    }

    #[test]
    fn missing_key_is_reported() {
        let config = AppConfig::default();
        let warnings = warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("OPENAI_API_KEY"));
    }

    #[test]
    fn keyed_default_has_no_warnings() {
        let mut config = AppConfig::default();
        config.providers.openai.api_key = Some("sk-test".into());
        assert!(warnings(&config).is_empty());
    }
}
