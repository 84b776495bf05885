// Storage for the Gemini API key
//
// The key is read from <data_dir>/secrets.toml when it is not supplied via
// GOOGLE_AI_API_KEY / --api-key. Keep this file out of version control.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the secrets file inside the data directory
pub const SECRETS_FILE_NAME: &str = "secrets.toml";

/// Secrets stored in secrets.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    /// Gemini API key
    #[serde(default)]
    pub api_key: Option<String>,
}

impl SecretsConfig {
    /// Load secrets from disk; a missing file yields empty secrets
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read secrets file '{}': {}", path.display(), e))?;

        toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse secrets file '{}': {}", path.display(), e))
    }

    /// The API key, if present and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let secrets = SecretsConfig::load_from(&temp_dir.path().join(SECRETS_FILE_NAME)).unwrap();
        assert!(secrets.api_key().is_none());
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let secrets: SecretsConfig = toml::from_str("api_key = \"  \"").unwrap();
        assert!(secrets.api_key().is_none());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SECRETS_FILE_NAME);
        fs::write(&path, "api_key = ").unwrap();
        assert!(SecretsConfig::load_from(&path).is_err());
    }
}
