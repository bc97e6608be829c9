//! Configuration resolution for plateful
//!
//! Two-tier resolution with ENV → TOML priority: every key can come from a
//! `PLATEFUL_*` environment variable or from the TOML config file, with
//! environment taking precedence. Backend credentials are required; tuning
//! knobs fall back to named defaults.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::services::classifier::DEFAULT_CONFIDENCE_THRESHOLD;

/// Default TOML config location, overridable via `PLATEFUL_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "plateful.toml";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8643";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_UPLOAD_FOLDER: &str = "plateful";

/// Retry policy for transient backend failures.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts including the first (default 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts in seconds (default 2)
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_secs() -> u64 {
    2
}

/// Image store (Cloudinary) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    #[serde(default = "default_upload_folder")]
    pub folder: String,
}

fn default_upload_folder() -> String {
    DEFAULT_UPLOAD_FOLDER.to_string()
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub gemini_api_key: String,
    pub vision_api_key: String,
    pub youtube_api_key: String,
    pub upload: UploadConfig,
    pub gemini_model: String,
    pub classify_threshold: f32,
    pub retry: RetryPolicy,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(String, toml::de::Error),

    #[error("Missing configuration: {0}")]
    Missing(String),
}

/// Raw TOML shape; all keys optional so partial files are valid.
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    bind_addr: Option<String>,
    gemini_api_key: Option<String>,
    vision_api_key: Option<String>,
    youtube_api_key: Option<String>,
    gemini_model: Option<String>,
    classify_threshold: Option<f32>,
    cloudinary_cloud_name: Option<String>,
    cloudinary_upload_preset: Option<String>,
    cloudinary_folder: Option<String>,
    #[serde(default)]
    retry: Option<RetryPolicy>,
}

impl Config {
    /// Load configuration from the default path (or `PLATEFUL_CONFIG`),
    /// applying environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PLATEFUL_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load configuration from an explicit TOML path, applying environment
    /// overrides. A missing file is treated as an empty one.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let toml_config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
            let parsed: TomlConfig = toml::from_str(&content)
                .map_err(|e| ConfigError::Parse(path.display().to_string(), e))?;
            info!(path = %path.display(), "Loaded TOML config");
            parsed
        } else {
            TomlConfig::default()
        };

        let gemini_api_key =
            resolve_required("PLATEFUL_GEMINI_API_KEY", toml_config.gemini_api_key, path)?;
        let vision_api_key =
            resolve_required("PLATEFUL_VISION_API_KEY", toml_config.vision_api_key, path)?;
        let youtube_api_key =
            resolve_required("PLATEFUL_YOUTUBE_API_KEY", toml_config.youtube_api_key, path)?;
        let cloud_name = resolve_required(
            "PLATEFUL_CLOUDINARY_CLOUD_NAME",
            toml_config.cloudinary_cloud_name,
            path,
        )?;
        let upload_preset = resolve_required(
            "PLATEFUL_CLOUDINARY_UPLOAD_PRESET",
            toml_config.cloudinary_upload_preset,
            path,
        )?;

        let bind_addr = resolve_optional("PLATEFUL_BIND_ADDR", toml_config.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let gemini_model = resolve_optional("PLATEFUL_GEMINI_MODEL", toml_config.gemini_model)
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let folder = resolve_optional("PLATEFUL_CLOUDINARY_FOLDER", toml_config.cloudinary_folder)
            .unwrap_or_else(default_upload_folder);

        let classify_threshold = match std::env::var("PLATEFUL_CLASSIFY_THRESHOLD") {
            Ok(raw) => raw.parse::<f32>().map_err(|_| {
                ConfigError::Missing(format!(
                    "PLATEFUL_CLASSIFY_THRESHOLD is not a number: {raw}"
                ))
            })?,
            Err(_) => toml_config
                .classify_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
        };

        Ok(Config {
            bind_addr,
            gemini_api_key,
            vision_api_key,
            youtube_api_key,
            upload: UploadConfig {
                cloud_name,
                upload_preset,
                folder,
            },
            gemini_model,
            classify_threshold,
            retry: toml_config.retry.unwrap_or_default(),
        })
    }
}

fn resolve_optional(env_key: &str, toml_value: Option<String>) -> Option<String> {
    match std::env::var(env_key) {
        Ok(value) if is_valid_key(&value) => Some(value),
        _ => toml_value.filter(|v| is_valid_key(v)),
    }
}

fn resolve_required(
    env_key: &str,
    toml_value: Option<String>,
    path: &Path,
) -> Result<String, ConfigError> {
    resolve_optional(env_key, toml_value).ok_or_else(|| {
        ConfigError::Missing(format!(
            "{env_key} not configured. Set the environment variable or add the \
             matching key to {}",
            path.display()
        ))
    })
}

/// Validate a key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
