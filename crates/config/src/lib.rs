//! Configuration loading, validation, and management for Socio.
//!
//! Loads configuration from `~/.socio/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! Image thresholds, keyword lists and blur radii are policy, not
//! mechanism: they live here so operators can tune severity without
//! rebuilding.

use serde::{Deserialize, Serialize};
use socio_core::{ImageAction, SafeSearchCategory};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.socio/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Where logs and the encryption key live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Text redaction settings
    #[serde(default)]
    pub text: TextConfig,

    /// Image policy: thresholds, keyword sets, blur radii
    #[serde(default)]
    pub image: ImagePolicyConfig,

    /// Built-in lexicon detector word lists
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Vision collaborator settings
    #[serde(default)]
    pub vision: VisionConfig,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins. Empty = any origin (extension pages use
    /// `chrome-extension://` origins that are not known up front).
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Request body limit; image requests may carry `data:` URLs.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Expose the `/debug/*` routes
    #[serde(default = "default_true")]
    pub debug_routes: bool,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: vec![],
            max_body_bytes: default_max_body_bytes(),
            debug_routes: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per processed event
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// File holding the symmetric encryption key
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
}

fn default_log_dir() -> PathBuf {
    AppConfig::config_dir().join("logs")
}
fn default_key_file() -> PathBuf {
    AppConfig::config_dir().join("encryption_key.key")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            key_file: default_key_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Replacement shown for encrypted text
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Character repeated over removed text
    #[serde(default = "default_mask_char")]
    pub mask_char: char,
}

fn default_placeholder() -> String {
    "[Encrypted content]".into()
}
fn default_mask_char() -> char {
    '*'
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            mask_char: default_mask_char(),
        }
    }
}

/// Per-category safe-search thresholds; a score at or above the threshold
/// flags the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeSearchThresholds {
    #[serde(default = "default_adult_threshold")]
    pub adult: f32,
    #[serde(default = "default_violence_threshold")]
    pub violence: f32,
    #[serde(default = "default_racy_threshold")]
    pub racy: f32,
    #[serde(default = "default_medical_threshold")]
    pub medical: f32,
    #[serde(default = "default_spoof_threshold")]
    pub spoof: f32,
}

fn default_adult_threshold() -> f32 {
    0.7
}
fn default_violence_threshold() -> f32 {
    0.6
}
fn default_racy_threshold() -> f32 {
    0.7
}
fn default_medical_threshold() -> f32 {
    0.8
}
fn default_spoof_threshold() -> f32 {
    0.8
}

impl SafeSearchThresholds {
    pub fn for_category(&self, category: SafeSearchCategory) -> f32 {
        match category {
            SafeSearchCategory::Adult => self.adult,
            SafeSearchCategory::Violence => self.violence,
            SafeSearchCategory::Racy => self.racy,
            SafeSearchCategory::Medical => self.medical,
            SafeSearchCategory::Spoof => self.spoof,
        }
    }
}

impl Default for SafeSearchThresholds {
    fn default() -> Self {
        Self {
            adult: default_adult_threshold(),
            violence: default_violence_threshold(),
            racy: default_racy_threshold(),
            medical: default_medical_threshold(),
            spoof: default_spoof_threshold(),
        }
    }
}

/// Gaussian blur radius the extension applies per severity tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlurRadii {
    #[serde(rename = "unsafe", default = "default_unsafe_blur")]
    pub unsafe_tier: u32,
    #[serde(default = "default_questionable_blur")]
    pub questionable: u32,
    #[serde(default = "default_potentially_concerning_blur")]
    pub potentially_concerning: u32,
    #[serde(default)]
    pub safe: u32,
}

fn default_unsafe_blur() -> u32 {
    30
}
fn default_questionable_blur() -> u32 {
    15
}
fn default_potentially_concerning_blur() -> u32 {
    8
}

impl Default for BlurRadii {
    fn default() -> Self {
        Self {
            unsafe_tier: default_unsafe_blur(),
            questionable: default_questionable_blur(),
            potentially_concerning: default_potentially_concerning_blur(),
            safe: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePolicyConfig {
    #[serde(default)]
    pub thresholds: SafeSearchThresholds,

    #[serde(default)]
    pub blur: BlurRadii,

    /// Labels must score strictly above this to be flagged
    #[serde(default = "default_min_score")]
    pub label_min_score: f32,

    /// Objects must score strictly above this to be flagged
    #[serde(default = "default_min_score")]
    pub object_min_score: f32,

    /// Substrings (case-insensitive) that make a label concerning
    #[serde(default = "default_concerning_keywords")]
    pub concerning_keywords: Vec<String>,

    /// Object names (exact match) that are concerning
    #[serde(default = "default_concerning_objects")]
    pub concerning_objects: Vec<String>,

    /// Terms (case-insensitive substring) that make embedded text offensive
    #[serde(default = "default_offensive_terms")]
    pub offensive_terms: Vec<String>,

    /// Action for the `potentially_concerning` tier: "blur" or "warn"
    #[serde(default = "default_potentially_concerning_action")]
    pub potentially_concerning_action: ImageAction,
}

fn default_min_score() -> f32 {
    0.7
}
fn default_potentially_concerning_action() -> ImageAction {
    ImageAction::Blur
}

fn default_concerning_keywords() -> Vec<String> {
    [
        "weapon", "gun", "knife", "blood", "drug", "alcohol", "cigarette", "smoking", "death",
        "corpse", "nazi", "hate", "explicit", "nude", "naked", "underwear",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_concerning_objects() -> Vec<String> {
    ["Weapon", "Gun", "Knife", "Alcohol", "Cigarette", "Drug"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_offensive_terms() -> Vec<String> {
    [
        "hate", "kill", "attack", "racist", "nazi", "violence", "offensive", "explicit",
        "suicide", "abuse", "murder", "slur", "profanity", "obscene",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ImagePolicyConfig {
    fn default() -> Self {
        Self {
            thresholds: SafeSearchThresholds::default(),
            blur: BlurRadii::default(),
            label_min_score: default_min_score(),
            object_min_score: default_min_score(),
            concerning_keywords: default_concerning_keywords(),
            concerning_objects: default_concerning_objects(),
            offensive_terms: default_offensive_terms(),
            potentially_concerning_action: default_potentially_concerning_action(),
        }
    }
}

/// Word lists for the built-in lexicon detector. Terms match whole words
/// or phrases, case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_hate_terms")]
    pub hate_terms: Vec<String>,

    #[serde(default = "default_profanity_terms")]
    pub profanity_terms: Vec<String>,

    /// Sensitive-information detectors to run. Known names: `email`,
    /// `phone_number`, `credit_card`, `ssn`, `ip_address`.
    #[serde(default = "default_sensitive_categories")]
    pub sensitive_categories: Vec<String>,
}

fn default_hate_terms() -> Vec<String> {
    [
        "kill you",
        "kill yourself",
        "hate you",
        "you should die",
        "subhuman",
        "exterminate",
        "white power",
        "go back to your country",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_profanity_terms() -> Vec<String> {
    [
        "damn", "hell", "shit", "fuck", "fucking", "bitch", "bastard", "asshole", "crap",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_sensitive_categories() -> Vec<String> {
    ["email", "phone_number", "credit_card", "ssn", "ip_address"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hate_terms: default_hate_terms(),
            profanity_terms: default_profanity_terms(),
            sensitive_categories: default_sensitive_categories(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Google Cloud Vision API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_vision_timeout")]
    pub timeout_secs: u64,
}

fn default_vision_endpoint() -> String {
    "https://vision.googleapis.com/v1/images:annotate".into()
}
fn default_vision_timeout() -> u64 {
    10
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_vision_endpoint(),
            timeout_secs: default_vision_timeout(),
        }
    }
}

impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field(
                "api_key",
                &match self.api_key {
                    Some(_) => "[REDACTED]",
                    None => "None",
                },
            )
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.socio/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `SOCIO_LOG_DIR`, `SOCIO_KEY_FILE`, `SOCIO_PORT`
    /// - `GOOGLE_CLOUD_API_KEY` (only when no key is configured)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
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

    /// Apply environment overrides through `var`, a lookup function so tests
    /// can supply their own environment.
    pub fn apply_env_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = var("SOCIO_LOG_DIR") {
            self.storage.log_dir = PathBuf::from(dir);
        }
        if let Some(file) = var("SOCIO_KEY_FILE") {
            self.storage.key_file = PathBuf::from(file);
        }
        if let Some(port) = var("SOCIO_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("SOCIO_PORT is not a valid port: {port}"))
            })?;
        }
        if self.vision.api_key.is_none() {
            self.vision.api_key = var("GOOGLE_CLOUD_API_KEY").filter(|k| !k.is_empty());
        }
        Ok(())
    }

    /// Get the configuration directory path (`$SOCIO_HOME` or `~/.socio`).
    pub fn config_dir() -> PathBuf {
        match std::env::var("SOCIO_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs_home().join(".socio"),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = &self.image.thresholds;
        for category in SafeSearchCategory::ALL {
            let value = thresholds.for_category(category);
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "image.thresholds.{category} must be between 0.0 and 1.0"
                )));
            }
        }

        for (name, value) in [
            ("label_min_score", self.image.label_min_score),
            ("object_min_score", self.image.object_min_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "image.{name} must be between 0.0 and 1.0"
                )));
            }
        }

        if !matches!(
            self.image.potentially_concerning_action,
            ImageAction::Blur | ImageAction::Warn
        ) {
            return Err(ConfigError::ValidationError(
                "image.potentially_concerning_action must be \"blur\" or \"warn\"".into(),
            ));
        }

        if self.text.placeholder.is_empty() {
            return Err(ConfigError::ValidationError(
                "text.placeholder cannot be empty".into(),
            ));
        }

        if self.gateway.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_body_bytes must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            storage: StorageConfig::default(),
            text: TextConfig::default(),
            image: ImagePolicyConfig::default(),
            detector: DetectorConfig::default(),
            vision: VisionConfig::default(),
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

impl From<ConfigError> for socio_core::Error {
    fn from(err: ConfigError) -> Self {
        socio_core::Error::Config {
            message: err.to_string(),
        }
    }
}
