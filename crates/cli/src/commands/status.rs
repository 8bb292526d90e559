//! `socio status`: Show configuration and storage status.
//!
//! Read-only: never creates the log directory or generates a key.

use socio_config::AppConfig;
use socio_core::LogStore;
use socio_security::CipherVault;
use socio_store::FileLogStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Socio Status");
    println!("============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Log dir:      {}", config.storage.log_dir.display());
    println!("  Key file:     {}", config.storage.key_file.display());
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  Vision:       {}",
        if config.vision.api_key.is_some() { "configured" } else { "not configured" }
    );
    println!(
        "  Categories:   {}",
        config.detector.sensitive_categories.join(", ")
    );

    if config.storage.key_file.exists() {
        match CipherVault::initialize(&config.storage.key_file) {
            Ok(vault) => println!(
                "  Key:          present (fingerprint {})",
                vault.fingerprint()
            ),
            Err(e) => println!("  Key:          unreadable ({e})"),
        }
    } else {
        println!("  Key:          not generated yet");
    }

    if config.storage.log_dir.exists() {
        let store = FileLogStore::new(&config.storage.log_dir)?;
        println!("  Log records:  {}", store.count().await?);
    } else {
        println!("  Log records:  0 (directory not created yet)");
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, using defaults (run `socio onboard` to write one)");
    }

    Ok(())
}
