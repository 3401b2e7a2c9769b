//! Configuration loading.
//!
//! Settings come from an optional TOML file, then the `GITHUB_USERNAME` and
//! `GITHUB_TOKEN` environment variables, then whatever the caller overrides.

use crate::cache::DEFAULT_TTL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Environment variable holding the GitHub account name.
pub const ACCOUNT_ENV: &str = "GITHUB_USERNAME";

/// Environment variable holding the GitHub access token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Errors that can occur during configuration parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse config in '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Validation error in the configuration.
    #[error("Validation error in '{path}': {message}")]
    ValidationError { path: String, message: String },
}

/// Settings for fetching projects and loading blog posts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PortfolioConfig {
    /// GitHub account whose repositories are listed.
    pub account: String,

    /// GitHub access token. Requests are unauthenticated without one.
    pub token: Option<String>,

    /// Base URL of the GitHub REST API.
    pub api_base_url: String,

    /// Base URL serving raw repository files.
    pub raw_base_url: String,

    /// Freshness window of the cached project list, in seconds.
    pub cache_ttl_secs: u64,

    /// Upper bound on any single remote request, in seconds.
    pub request_timeout_secs: u64,

    /// Directory containing Markdown blog posts.
    pub blog_dir: PathBuf,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            token: None,
            api_base_url: "https://api.github.com".to_string(),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            request_timeout_secs: 10,
            blog_dir: PathBuf::from("content/blog"),
        }
    }
}

impl PortfolioConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Keys not present in the file keep their defaults. The result is not
    /// validated, since the environment may still fill in missing values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading config");

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::TomlError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Fills account and token from the environment when set and non-empty.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(account) = non_empty_env(ACCOUNT_ENV) {
            self.account = account;
        }
        if let Some(token) = non_empty_env(TOKEN_ENV) {
            self.token = Some(token);
        }
        self
    }

    /// Returns the project cache freshness window.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Returns the per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Checks that the configuration can be used to build clients.
    ///
    /// The token is optional and not checked.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first invalid key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::ValidationError {
            path: "config".to_string(),
            message,
        };

        if self.account.trim().is_empty() {
            return Err(invalid(format!(
                "account must not be empty (set it in the config file or {ACCOUNT_ENV})"
            )));
        }

        if self.account.contains('/') {
            return Err(invalid("account must not contain '/'".to_string()));
        }

        for (key, value) in [
            ("api-base-url", &self.api_base_url),
            ("raw-base-url", &self.raw_base_url),
        ] {
            if Url::parse(value).is_err() {
                return Err(invalid(format!("{key} is not a valid URL: {value}")));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(invalid(
                "request-timeout-secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
