//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend base URL, the authorization scheme, the login endpoint and
//! route, and where the session token is kept.
//!
//! Configuration is stored at `~/.config/stockboard/config.json`.
//! A few fields can be overridden from the environment (see
//! [`Config::apply_env`]).

use std::path::PathBuf;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "stockboard";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8099";
pub const DEFAULT_AUTH_SCHEME: &str = "Bearer";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "/login";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_TOKEN_KEY: &str = "token";

pub const ENV_BASE_URL: &str = "STOCKBOARD_BASE_URL";
pub const ENV_AUTH_SCHEME: &str = "STOCKBOARD_AUTH_SCHEME";
pub const ENV_TOKEN_BACKEND: &str = "STOCKBOARD_TOKEN_BACKEND";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find {0} directory")]
    NoDirectory(&'static str),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Authorization scheme must not be empty")]
    EmptyAuthScheme,

    #[error("Unknown token backend '{0}' (expected file, keyring or memory)")]
    UnknownTokenBackend(String),

    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the session token is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl std::str::FromStr for TokenBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenBackend::File),
            "keyring" => Ok(TokenBackend::Keyring),
            "memory" => Ok(TokenBackend::Memory),
            other => Err(ConfigError::UnknownTokenBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub auth_scheme: String,
    pub login_endpoint: String,
    /// Client-side route the user is sent to when the backend answers 401
    pub login_route: String,
    /// Storage key (file name / keychain user) for the token slot
    pub token_key: String,
    pub token_backend: TokenBackend,
    pub request_timeout_secs: Option<u64>,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            token_backend: TokenBackend::default(),
            request_timeout_secs: None,
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from `STOCKBOARD_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(scheme) = lookup(ENV_AUTH_SCHEME).filter(|v| !v.is_empty()) {
            self.auth_scheme = scheme;
        }
        if let Some(backend) = lookup(ENV_TOKEN_BACKEND).filter(|v| !v.is_empty()) {
            self.token_backend = backend.parse()?;
        }
        Ok(())
    }

    /// Check the fields the HTTP client depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;
        if self.auth_scheme.trim().is_empty() {
            return Err(ConfigError::EmptyAuthScheme);
        }
        Ok(())
    }

    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{}'", other))),
        }
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        let cache_dir = dirs::cache_dir().ok_or(ConfigError::NoDirectory("cache"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
