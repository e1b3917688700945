//! `appforge serve`: start the HTTP API server.

use appforge_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("AppForge Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {}", config.default_provider);
    println!("   Max body:  {} bytes", config.gateway.max_body_bytes);
    println!(
        "   Quota:     {}",
        if config.usage.enabled {
            format!("{} requests/day", config.usage.daily_limit)
        } else {
            "disabled".to_string()
        }
    );

    appforge_gateway::start(config).await?;

    Ok(())
}
