//! In-memory [`RepositorySource`] for unit tests.

use super::{Repository, RepositorySource, SourceError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock repository host with scripted responses and a call log.
#[derive(Default)]
pub(crate) struct MockSource {
    repositories: Mutex<Option<Vec<Repository>>>,
    default_branches: Mutex<HashMap<String, String>>,
    readmes: Mutex<HashMap<(String, String), String>>,
    list_calls: AtomicUsize,
    readme_requests: Mutex<Vec<(String, String)>>,
}

impl MockSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes the listing call succeed with `names`, in order.
    pub(crate) fn with_repositories(self, names: &[&str]) -> Self {
        *self.repositories.lock().unwrap() = Some(names.iter().map(|n| repository(n)).collect());
        self
    }

    /// Declares the default branch of `repo`. Undeclared lookups fail.
    pub(crate) fn with_default_branch(self, repo: &str, branch: &str) -> Self {
        self.default_branches
            .lock()
            .unwrap()
            .insert(repo.to_string(), branch.to_string());
        self
    }

    /// Serves `content` as the README of `repo` at `branch`.
    pub(crate) fn with_readme(self, repo: &str, branch: &str, content: &str) -> Self {
        self.readmes
            .lock()
            .unwrap()
            .insert((repo.to_string(), branch.to_string()), content.to_string());
        self
    }

    /// Number of listing calls made so far.
    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Branches requested for `repo`, in request order.
    pub(crate) fn readme_requests(&self, repo: &str) -> Vec<String> {
        self.readme_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == repo)
            .map(|(_, branch)| branch.clone())
            .collect()
    }
}

pub(crate) fn repository(name: &str) -> Repository {
    Repository {
        name: name.to_string(),
        description: Some(format!("{name} description")),
        html_url: format!("https://github.com/octo/{name}"),
        homepage: None,
        topics: Vec::new(),
    }
}

fn not_found(url: String) -> SourceError {
    SourceError::Status { url, status: 404 }
}

#[async_trait]
impl RepositorySource for MockSource {
    async fn list_repositories(&self) -> Result<Vec<Repository>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.repositories
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| not_found("users/octo/repos".to_string()))
    }

    async fn default_branch(&self, repo: &str) -> Result<Option<String>, SourceError> {
        self.default_branches
            .lock()
            .unwrap()
            .get(repo)
            .cloned()
            .map(Some)
            .ok_or_else(|| not_found(format!("repos/octo/{repo}")))
    }

    async fn fetch_readme(&self, repo: &str, branch: &str) -> Result<String, SourceError> {
        self.readme_requests
            .lock()
            .unwrap()
            .push((repo.to_string(), branch.to_string()));
        self.readmes
            .lock()
            .unwrap()
            .get(&(repo.to_string(), branch.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("octo/{repo}/{branch}/README.md")))
    }
}
