//! Wires configuration into the project catalog and blog store.

use crate::blog::{BlogError, BlogStore};
use crate::config::{ConfigError, PortfolioConfig};
use crate::github::GitHubSource;
use crate::projects::ProjectCatalog;
use tracing::info;

/// Errors that can occur while setting up the portfolio.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    /// Configuration loading or validation errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// Blog content errors.
    #[error(transparent)]
    Blog(#[from] BlogError),
}

/// Data sources backing the portfolio pages.
///
/// Built once at startup and shared by reference; the project cache lives as
/// long as this value.
pub struct Portfolio {
    config: PortfolioConfig,
    projects: ProjectCatalog<GitHubSource>,
    blog: BlogStore,
}

impl Portfolio {
    /// Builds the portfolio from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError`] if the configuration is invalid or the
    /// GitHub client cannot be built.
    pub fn new(config: PortfolioConfig) -> Result<Self, PortfolioError> {
        config.validate()?;

        let source = GitHubSource::new(&config)?;
        info!(
            account = %config.account,
            authenticated = config.token.is_some(),
            ttl_secs = config.cache_ttl_secs,
            "Portfolio initialized"
        );

        Ok(Self {
            projects: ProjectCatalog::new(source, config.cache_ttl()),
            blog: BlogStore::new(config.blog_dir.clone()),
            config,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Returns the cached showcase project catalog.
    pub fn projects(&self) -> &ProjectCatalog<GitHubSource> {
        &self.projects
    }

    /// Returns the blog post store.
    pub fn blog(&self) -> &BlogStore {
        &self.blog
    }
}
