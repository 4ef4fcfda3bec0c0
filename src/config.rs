//! Configuration stored in ~/.orgdash/config.json.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dashboard::ProjectLoading;
use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://sentry.io/api/0/";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL every endpoint path is joined onto.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Organization slug shown when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default)]
    pub project_loading: ProjectLoading,
    /// Use the lightweight teams listing (`?lite=1`).
    #[serde(default)]
    pub lite_teams: bool,
    /// Attach every project to every team (elevated viewers).
    #[serde(default)]
    pub show_all_teams: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            auth_token: None,
            organization: None,
            project_loading: ProjectLoading::default(),
            lite_teams: false,
            show_all_teams: false,
            request_timeout_secs: default_request_timeout_secs(),
            log_level: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api_url)
            .map_err(|e| ConfigError::Invalid(format!("apiUrl {:?}: {}", self.api_url, e)))?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "requestTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".orgdash").join("config.json"))
}

/// Load and validate the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load ~/.orgdash/config.json, falling back to defaults when it is absent.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path()?;
    match load_config_from(&path) {
        Err(ConfigError::NotFound(path)) => {
            log::info!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
        other => other,
    }
}
