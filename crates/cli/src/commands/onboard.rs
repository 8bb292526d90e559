//! `socio onboard`: First-time setup.

use socio_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Socio: First-Time Setup");
    println!("=======================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\nConfig already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if !config.storage.log_dir.exists() {
        std::fs::create_dir_all(&config.storage.log_dir)?;
        println!("Created log directory: {}", config.storage.log_dir.display());
    }

    println!("\nNext steps:");
    println!("   1. Optionally set GOOGLE_CLOUD_API_KEY to enable image analysis");
    println!("   2. Run: socio serve");
    println!(
        "   3. Point the browser extension at http://{}:{}\n",
        config.gateway.host, config.gateway.port
    );

    println!(
        "The encryption key is generated on first use at: {}",
        config.storage.key_file.display()
    );

    Ok(())
}
