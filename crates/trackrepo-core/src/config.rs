use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("trackrepo/", env!("CARGO_PKG_VERSION"));
pub const API_URL_ENV: &str = "TRACKREPO_GITHUB_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackrepoConfig {
    pub github: GithubConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for TrackrepoConfig {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GithubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub fn resolve_config_dir() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs.home_dir().join(".config").join("trackrepo"))
}

pub fn resolve_config_path() -> Result<PathBuf, ConfigError> {
    Ok(resolve_config_dir()?.join("config.toml"))
}

pub fn resolve_settings_path() -> Result<PathBuf, ConfigError> {
    Ok(resolve_config_dir()?.join("repository.toml"))
}

/// Loads the optional application config. A missing file yields defaults;
/// the API URL environment override is applied last.
pub fn load_config(path: &Path) -> Result<TrackrepoConfig, ConfigError> {
    let mut config = if path.exists() {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        TrackrepoConfig::default()
    };

    if let Some(api_url) = std::env::var_os(API_URL_ENV) {
        config.github.api_url = api_url.to_string_lossy().into_owned();
    }

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &TrackrepoConfig) -> Result<(), ConfigError> {
    let api_url = config.github.api_url.trim();
    if api_url.is_empty() {
        return Err(ConfigError::Validation {
            message: "github.api_url must be non-empty".to_string(),
        });
    }

    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(ConfigError::Validation {
            message: format!("github.api_url must be an http(s) URL, got '{api_url}'"),
        });
    }

    if config.github.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "github.timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.github.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "github.user_agent must be non-empty".to_string(),
        });
    }

    Ok(())
}
