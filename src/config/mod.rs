//! Application configuration
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `~/.bhai-ki-advice/config.toml` (or `--config <path>`)
//! 3. Command-line flags / environment variables
//!
//! The Gemini API key is a secret: it comes from `GOOGLE_AI_API_KEY`
//! (or `--api-key`) or from `secrets.toml`, never from source.

pub mod secrets;

pub use secrets::SecretsConfig;

use crate::error::ConfigError;
use crate::file_storage::get_global_data_dir;
use crate::generation::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::generation::GeminiSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the optional config file inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_PORT: u16 = 3420;
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            cors_origins: Vec::new(),
        }
    }
}

/// Generation provider settings (the key lives in secrets)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory; defaults to `~/.bhai-ki-advice`
    pub data_dir: Option<PathBuf>,
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Default config file path (`~/.bhai-ki-advice/config.toml`)
    pub fn default_path() -> PathBuf {
        get_global_data_dir().join(CONFIG_FILE_NAME)
    }

    /// Load config from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml(&contents).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(get_global_data_dir)
    }

    /// Build Gemini settings, failing fast when no API key is available
    pub fn gemini_settings(&self, api_key: Option<String>) -> Result<GeminiSettings, ConfigError> {
        let api_key = resolve_api_key(api_key, &self.data_dir())?;
        Ok(GeminiSettings::new(api_key)
            .with_model(self.generation.model.clone())
            .with_base_url(self.generation.base_url.clone()))
    }
}

/// Pick the API key from the explicit value (flag/env) or the secrets file
pub fn resolve_api_key(explicit: Option<String>, data_dir: &Path) -> Result<String, ConfigError> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(key.trim().to_string());
    }

    let secrets_path = data_dir.join(secrets::SECRETS_FILE_NAME);
    match SecretsConfig::load_from(&secrets_path) {
        Ok(secrets) => {
            if let Some(key) = secrets.api_key() {
                log::info!("Using Gemini API key from {:?}", secrets_path);
                return Ok(key.to_string());
            }
        }
        Err(e) => log::warn!("{}", e),
    }

    Err(ConfigError::MissingApiKey(secrets_path.display().to_string()))
}
