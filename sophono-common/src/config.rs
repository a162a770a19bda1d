//! Configuration loading and resolution
//!
//! Priority order for every setting, highest first:
//! 1. Command-line argument (handled by the binaries via clap)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing config file is not an error: the service logs a warning and runs
//! on compiled defaults. A config file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SOPHONO_CONFIG";

/// Environment variable holding the text-generation API key
pub const API_KEY_ENV_VAR: &str = "SOPHONO_API_KEY";

/// Environment variable overriding the collaborator base URL
pub const BASE_URL_ENV_VAR: &str = "SOPHONO_BASE_URL";

/// Environment variable overriding the collaborator model
pub const MODEL_ENV_VAR: &str = "SOPHONO_MODEL";

/// Full TOML configuration
///
/// ```toml
/// [server]
/// bind_addr = "127.0.0.1:5790"
///
/// [collaborator]
/// model = "llama3-70b-8192"
/// timeout_secs = 120
///
/// [estimate]
/// stream_ceiling = 100000000
/// revenue_per_stream = 0.004
/// clamp_score = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub collaborator: CollaboratorConfig,
    pub estimate: EstimateSettings,
    pub logging: LoggingConfig,
    pub staging: StagingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5790".to_string(),
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Text-generation collaborator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorConfig {
    /// OpenAI-compatible API root (the client appends `/chat/completions`)
    pub base_url: String,
    /// Never compiled in; see [`resolve_api_key`]
    pub api_key: Option<String>,
    pub model: String,
    pub music_temperature: f32,
    pub lyrics_temperature: f32,
    pub max_tokens: u32,
    /// 0 disables the request timeout
    pub timeout_secs: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "llama3-70b-8192".to_string(),
            music_temperature: 0.5,
            lyrics_temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 120,
        }
    }
}

/// Stream/revenue estimate settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateSettings {
    pub stream_ceiling: u64,
    pub revenue_per_stream: f64,
    /// Clamp the collaborator's score into [0, 100] before rescaling
    pub clamp_score: bool,
}

impl Default for EstimateSettings {
    fn default() -> Self {
        Self {
            stream_ceiling: 100_000_000,
            revenue_per_stream: 0.004,
            clamp_score: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Upload staging settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory for staged uploads; system temp dir when unset
    pub dir: Option<PathBuf>,
}

impl StagingConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply environment variable overrides for collaborator settings
    ///
    /// The API key itself is resolved separately by [`resolve_api_key`].
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_blank_env(BASE_URL_ENV_VAR) {
            info!("Collaborator base URL overridden by {}", BASE_URL_ENV_VAR);
            self.collaborator.base_url = url;
        }
        if let Some(model) = non_blank_env(MODEL_ENV_VAR) {
            info!("Collaborator model overridden by {}", MODEL_ENV_VAR);
            self.collaborator.model = model;
        }
    }
}

/// Locate the config file
///
/// **Priority:** CLI argument → `SOPHONO_CONFIG` → `<config_dir>/sophono/config.toml`
///
/// The CLI and environment paths are returned even if they do not exist, so a
/// mistyped explicit path is reported instead of silently ignored. The platform
/// default is returned only when present.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = non_blank_env(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    default_config_path().filter(|p| p.exists())
}

/// Platform config file location (`~/.config/sophono/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sophono").join("config.toml"))
}

/// Load configuration with graceful degradation
///
/// - No config file found → compiled defaults (warning logged)
/// - Explicit file missing or unparsable → `Error::Config`
///
/// Environment overrides are applied on top of whatever was loaded.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) => {
            info!("Loading config: {}", path.display());
            TomlConfig::from_file(&path)?
        }
        None => {
            warn!("No config file found, using compiled defaults");
            TomlConfig::default()
        }
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Resolve the collaborator API key
///
/// **Priority:** `SOPHONO_API_KEY` → TOML `collaborator.api_key`
///
/// Returns `None` when neither source holds a valid key; callers decide whether
/// that is fatal.
pub fn resolve_api_key(collaborator: &CollaboratorConfig) -> Option<String> {
    let env_key = std::env::var(API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k));
    let toml_key = collaborator.api_key.clone().filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "API key found in both {} and TOML config. Using environment (higher priority).",
            API_KEY_ENV_VAR
        );
    }

    if let Some(key) = env_key {
        info!("API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("API key loaded from TOML config");
        return Some(key);
    }

    warn!(
        "Text-generation API key not configured. Set {} or collaborator.api_key in the config file.",
        API_KEY_ENV_VAR
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:5790");
        assert_eq!(config.collaborator.model, "llama3-70b-8192");
        assert_eq!(config.collaborator.max_tokens, 1024);
        assert_eq!(config.estimate.stream_ceiling, 100_000_000);
        assert!((config.estimate.revenue_per_stream - 0.004).abs() < f64::EPSILON);
        assert!(config.estimate.clamp_score);
        assert!(config.collaborator.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [estimate]
            stream_ceiling = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.estimate.stream_ceiling, 5000);
        assert!(config.estimate.clamp_score);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[estimate\nstream_ceiling = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("gsk_abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }

    #[test]
    fn test_staging_dir_falls_back_to_temp() {
        let staging = StagingConfig::default();
        assert_eq!(staging.resolved_dir(), std::env::temp_dir());
    }
}
