use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ContosoError, Result};

/// Top-level configuration for the Contoso assistant.
///
/// Loaded from `~/.contoso/config.toml` by default. Each section corresponds
/// to one collaborator of the conversation controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContosoConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ContosoConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ContosoConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed. The load error, if any, is handed back so
    /// the caller can report it once logging is up.
    pub fn load_or_default(path: &Path) -> (Self, Option<ContosoError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ContosoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the SQLite file.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.contoso/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Inference backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Scheme, host and port of the inference service.
    pub base_url: String,
    /// Path of the chat endpoint, appended to `base_url`.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Email sent on behalf of users whose address is not confirmed.
    pub guest_email: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            endpoint: "/agent".to_string(),
            timeout_secs: 30,
            guest_email: "guest@contoso.com".to_string(),
        }
    }
}

impl BackendConfig {
    /// Full URL of the chat endpoint.
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}

/// Voice input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Initial position of the narration toggle.
    pub enabled: bool,
    /// Narrate the "email confirmed" message as well as backend replies.
    pub narrate_confirmations: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            narrate_confirmations: true,
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file name inside `general.data_dir`.
    pub db_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: "contoso.db".to_string(),
        }
    }
}
