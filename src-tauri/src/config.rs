use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Application-level constants
pub const APP_NAME: &str = "StepSync";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file read from the per-user config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment overrides. These win over the config file.
pub const ENV_ENDPOINT: &str = "STEPSYNC_ENDPOINT";
pub const ENV_BEARER_TOKEN: &str = "STEPSYNC_BEARER_TOKEN";
pub const ENV_HEALTH_DATA: &str = "STEPSYNC_HEALTH_DATA";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "stepsync_lib=info,stepsync=info,warn"
}

/// Per-user configuration directory, e.g. `~/.config/StepSync/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Location of `config.json`, when the platform has a config directory.
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No sync endpoint configured (set STEPSYNC_ENDPOINT or `endpoint` in config.json)")]
    MissingEndpoint,
    #[error("No bearer token configured (set STEPSYNC_BEARER_TOKEN or `bearer_token` in config.json)")]
    MissingToken,
    #[error("Invalid sync endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk shape of `config.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    endpoint: Option<String>,
    bearer_token: Option<String>,
    health_data_path: Option<PathBuf>,
}

/// Resolved sync configuration.
///
/// The bearer token is injected here, never compiled in, and is redacted
/// from `Debug` output so it cannot reach the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Full URL the step payload is POSTed to.
    pub endpoint: String,
    pub bearer_token: String,
    /// Step export read by the local health store (desktop builds).
    pub health_data_path: Option<PathBuf>,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("endpoint", &self.endpoint)
            .field("bearer_token", &"<redacted>")
            .field("health_data_path", &self.health_data_path)
            .finish()
    }
}

impl SyncConfig {
    /// Load from the default config file plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match config_file_path() {
            Some(path) => read_file_config(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let endpoint = non_empty(env(ENV_ENDPOINT))
            .or_else(|| non_empty(file.endpoint))
            .ok_or(ConfigError::MissingEndpoint)?;
        let bearer_token = non_empty(env(ENV_BEARER_TOKEN))
            .or_else(|| non_empty(file.bearer_token))
            .ok_or(ConfigError::MissingToken)?;
        let health_data_path = non_empty(env(ENV_HEALTH_DATA))
            .map(PathBuf::from)
            .or(file.health_data_path);

        let config = Self {
            endpoint,
            bearer_token,
            health_data_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// The endpoint must be an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            url: self.endpoint.clone(),
            reason,
        };
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "https" | "http" => {}
            other => return Err(invalid(format!("unsupported scheme `{other}`"))),
        }
        if self.bearer_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }
}

/// A missing file is not an error; it means "environment only".
fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using environment only");
        return Ok(FileConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
