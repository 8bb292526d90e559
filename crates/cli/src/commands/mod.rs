pub mod analyze;
pub mod history;
pub mod onboard;
pub mod recover;
pub mod serve;
pub mod status;

use socio_config::AppConfig;
use socio_engine::ModerationEngine;
use tracing::debug;

/// Load config and build the engine, as every data command does.
pub(crate) fn load_engine() -> Result<ModerationEngine, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    debug!(
        log_dir = %config.storage.log_dir.display(),
        key_file = %config.storage.key_file.display(),
        "Loading engine"
    );
    Ok(ModerationEngine::from_config(&config)?)
}
