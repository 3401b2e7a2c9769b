//! Abstraction over the remote repository host.
//!
//! The metadata pipeline only needs three calls from the host: list the
//! account's repositories, look up a repository's default branch, and read a
//! README at a given branch. [`RepositorySource`] captures those so the
//! pipeline can run against GitHub in production and a mock in tests.

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while talking to the repository host.
#[derive(Debug, Error)]
pub enum SourceError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// Request completed with a non-success status.
    #[error("Request to '{url}' failed with HTTP {status}")]
    Status { url: String, status: u16 },

    /// Request did not complete in time.
    #[error("{operation} timed out after {timeout_secs} seconds")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },
}

/// A repository as listed by the host.
///
/// This is a transient copy taken on every refresh, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// Repository name, unique within the account.
    pub name: String,

    /// Short description, if the owner set one.
    pub description: Option<String>,

    /// Canonical web URL.
    pub html_url: String,

    /// Project homepage, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Repository topics.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

/// Read access to the repositories of a single account.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Lists every repository of the configured account.
    async fn list_repositories(&self) -> Result<Vec<Repository>, SourceError>;

    /// Returns the declared default branch of `repo`, if the host reports one.
    async fn default_branch(&self, repo: &str) -> Result<Option<String>, SourceError>;

    /// Returns the raw `README.md` of `repo` at `branch`.
    async fn fetch_readme(&self, repo: &str, branch: &str) -> Result<String, SourceError>;
}

#[async_trait]
impl<S: RepositorySource + ?Sized> RepositorySource for std::sync::Arc<S> {
    async fn list_repositories(&self) -> Result<Vec<Repository>, SourceError> {
        (**self).list_repositories().await
    }

    async fn default_branch(&self, repo: &str) -> Result<Option<String>, SourceError> {
        (**self).default_branch(repo).await
    }

    async fn fetch_readme(&self, repo: &str, branch: &str) -> Result<String, SourceError> {
        (**self).fetch_readme(repo, branch).await
    }
}
