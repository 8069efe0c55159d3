//! Application configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.gridchat/` in
//! production) and applies environment variable overrides on top. Falls
//! back to sensible defaults when the file is missing or malformed, so a
//! fresh install works against a local Ollama with zero setup.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use gridchat_types::llm::GenerationConfig;

use crate::llm::remote::RemoteExecConfig;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434/v1";
pub const DEFAULT_MODEL: &str = "llama3.2:3b";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Which backend implementation serves completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    OpenaiCompat,
    Remote,
}

/// Inference backend settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub base_url: String,
    /// Not logged and not Debug-printed.
    pub api_key: Option<SecretString>,
    pub model: String,
    /// Smaller model used for title generation; `model` when unset.
    pub title_model: Option<String>,
    pub timeout_secs: u64,
    /// Required when `kind = "remote"`.
    pub remote: Option<RemoteExecConfig>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::OpenaiCompat,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            title_model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            remote: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub generation: GenerationConfig,
    /// Chat store location; `default_db_path()` when unset.
    pub db_path: Option<PathBuf>,
}

/// Data directory: `GRIDCHAT_DATA_DIR` env var, else `~/.gridchat`.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GRIDCHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".gridchat")
}

/// Load configuration from `{data_dir}/config.toml` and apply env overrides.
///
/// - If the file does not exist, starts from [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and starts from
///   the default rather than refusing to launch.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => match toml::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {}: {err}, using defaults",
                    config_path.display()
                );
                AppConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    config
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(url) = std::env::var("GRIDCHAT_BASE_URL") {
        config.backend.base_url = url;
    }
    if let Ok(key) = std::env::var("GRIDCHAT_API_KEY") {
        config.backend.api_key = Some(SecretString::from(key));
    }
    if let Ok(model) = std::env::var("GRIDCHAT_MODEL") {
        config.backend.model = model;
    }
}
