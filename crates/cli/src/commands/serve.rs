//! `socio serve`: Start the HTTP gateway.

use socio_config::AppConfig;

pub async fn run(
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    println!("Socio Gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Logs:       {}", config.storage.log_dir.display());
    println!(
        "   Vision:     {}",
        if config.vision.api_key.is_some() { "enabled" } else { "disabled (no API key)" }
    );

    socio_gateway::start(config).await?;

    Ok(())
}
