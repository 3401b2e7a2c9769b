//! GitHub-backed [`RepositorySource`].
//!
//! Listing and default-branch lookups go through the REST API; README content
//! is read from the raw content host. Every call is bounded by the configured
//! request timeout.

use crate::config::PortfolioConfig;
use crate::source::{Repository, RepositorySource, SourceError};
use async_trait::async_trait;
use octocrab::Octocrab;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Results per page when listing repositories.
const RESULTS_PER_PAGE: u8 = 100;

/// Name of the file carrying project metadata.
const README_FILE: &str = "README.md";

/// Repository source for a single GitHub account.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    octocrab: Octocrab,
    account: String,
    raw_base_url: String,
    request_timeout: Duration,
}

impl GitHubSource {
    /// Builds a GitHub client from configuration.
    ///
    /// A missing token is not an error; requests are then sent without
    /// authentication and subject to GitHub's anonymous limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base URL is rejected or the client cannot
    /// be built.
    pub fn new(config: &PortfolioConfig) -> Result<Self, octocrab::Error> {
        let mut builder = Octocrab::builder().base_uri(config.api_base_url.as_str())?;
        if let Some(token) = &config.token {
            builder = builder.personal_token(token.clone());
        }

        Ok(Self::with_client(builder.build()?, config))
    }

    /// Wraps an existing client.
    pub fn with_client(octocrab: Octocrab, config: &PortfolioConfig) -> Self {
        Self {
            octocrab,
            account: config.account.clone(),
            raw_base_url: config.raw_base_url.clone(),
            request_timeout: config.request_timeout(),
        }
    }

    /// Returns the account whose repositories are read.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Runs `request`, converting an elapsed deadline into [`SourceError::Timeout`].
    async fn bounded<T, F>(&self, operation: &str, request: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                operation: operation.to_string(),
                timeout_secs: self.request_timeout.as_secs(),
            }),
        }
    }
}

/// Builds the raw content URL of the README of `repo` at `branch`.
fn readme_url(raw_base_url: &str, account: &str, repo: &str, branch: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        raw_base_url.trim_end_matches('/'),
        account,
        repo,
        branch,
        README_FILE
    )
}

fn to_repository(repo: octocrab::models::Repository) -> Repository {
    let html_url = repo
        .html_url
        .map(|url| url.to_string())
        .unwrap_or_default();

    Repository {
        name: repo.name,
        description: repo.description,
        html_url,
        homepage: repo.homepage.filter(|homepage| !homepage.is_empty()),
        topics: repo.topics.unwrap_or_default(),
    }
}

#[async_trait]
impl RepositorySource for GitHubSource {
    async fn list_repositories(&self) -> Result<Vec<Repository>, SourceError> {
        self.bounded("listing repositories", async {
            let page = self
                .octocrab
                .users(&self.account)
                .repos()
                .per_page(RESULTS_PER_PAGE)
                .send()
                .await?;

            debug!(account = %self.account, count = page.items.len(), "Listed repositories");
            Ok(page.items.into_iter().map(to_repository).collect())
        })
        .await
    }

    async fn default_branch(&self, repo: &str) -> Result<Option<String>, SourceError> {
        self.bounded("default branch lookup", async {
            let repo_info = self.octocrab.repos(&self.account, repo).get().await?;
            Ok(repo_info.default_branch)
        })
        .await
    }

    async fn fetch_readme(&self, repo: &str, branch: &str) -> Result<String, SourceError> {
        let url = readme_url(&self.raw_base_url, &self.account, repo, branch);

        self.bounded("README retrieval", async {
            let response = self.octocrab._get(url.as_str()).await?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }

            Ok(self.octocrab.body_to_string(response).await?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Loopback HTTP server answering with canned bodies keyed by path.
    struct StubServer {
        base_url: String,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl StubServer {
        async fn start(routes: Vec<(&'static str, &'static str)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(Vec::new()));
            let log = Arc::clone(&requests);

            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => head.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&head);
                    let target = head.split_whitespace().nth(1).unwrap_or("").to_string();
                    let path = target.split('?').next().unwrap_or("");
                    let (status, body) = match routes.iter().find(|(route, _)| *route == path) {
                        Some((_, body)) => ("200 OK", *body),
                        None => ("404 Not Found", "404: Not Found"),
                    };
                    log.lock().unwrap().push(target.clone());

                    let response = format!(
                        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            });

            Self { base_url, requests }
        }

        fn config(&self) -> PortfolioConfig {
            PortfolioConfig {
                account: "octo".to_string(),
                api_base_url: self.base_url.clone(),
                raw_base_url: self.base_url.clone(),
                ..Default::default()
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    const REPOS_JSON: &str = r#"[
        {
            "id": 1,
            "name": "site",
            "url": "https://api.github.com/repos/octo/site",
            "html_url": "https://github.com/octo/site",
            "description": "Personal site",
            "homepage": "",
            "topics": ["rust", "web"]
        },
        {
            "id": 2,
            "name": "bare",
            "url": "https://api.github.com/repos/octo/bare",
            "description": null,
            "homepage": "https://bare.example.com"
        }
    ]"#;

    const REPO_JSON: &str = r#"{
        "id": 1,
        "name": "site",
        "url": "https://api.github.com/repos/octo/site",
        "default_branch": "trunk"
    }"#;

    #[test]
    fn builds_readme_url() {
        assert_eq!(
            readme_url("https://raw.githubusercontent.com", "octo", "site", "main"),
            "https://raw.githubusercontent.com/octo/site/main/README.md"
        );
    }

    #[test]
    fn readme_url_tolerates_trailing_slash() {
        assert_eq!(
            readme_url("http://localhost:8080/", "octo", "site", "develop"),
            "http://localhost:8080/octo/site/develop/README.md"
        );
    }

    #[tokio::test]
    async fn builds_client_without_token() {
        let config = PortfolioConfig {
            account: "octo".to_string(),
            ..Default::default()
        };

        let source = GitHubSource::new(&config).unwrap();

        assert_eq!(source.account(), "octo");
        assert_eq!(source.request_timeout, config.request_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_request_times_out() {
        let config = PortfolioConfig {
            account: "octo".to_string(),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let source = GitHubSource::new(&config).unwrap();

        let result: Result<(), SourceError> = source
            .bounded("slow call", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(SourceError::Timeout { timeout_secs: 2, .. })
        ));
    }

    #[tokio::test]
    async fn lists_repositories_from_api() {
        let server = StubServer::start(vec![("/users/octo/repos", REPOS_JSON)]).await;
        let source = GitHubSource::new(&server.config()).unwrap();

        let repos = source.list_repositories().await.unwrap();

        assert_eq!(server.requests(), vec!["/users/octo/repos?per_page=100"]);
        assert_eq!(repos.len(), 2);

        assert_eq!(repos[0].name, "site");
        assert_eq!(repos[0].html_url, "https://github.com/octo/site");
        assert_eq!(repos[0].description.as_deref(), Some("Personal site"));
        assert_eq!(repos[0].homepage, None);
        assert_eq!(repos[0].topics, vec!["rust", "web"]);

        assert_eq!(repos[1].name, "bare");
        assert_eq!(repos[1].html_url, "");
        assert_eq!(repos[1].description, None);
        assert_eq!(repos[1].homepage.as_deref(), Some("https://bare.example.com"));
        assert!(repos[1].topics.is_empty());
    }

    #[tokio::test]
    async fn reads_default_branch() {
        let server = StubServer::start(vec![("/repos/octo/site", REPO_JSON)]).await;
        let source = GitHubSource::new(&server.config()).unwrap();

        let branch = source.default_branch("site").await.unwrap();

        assert_eq!(branch.as_deref(), Some("trunk"));
    }

    #[tokio::test]
    async fn fetches_readme_body() {
        let readme = "---\ntitle: \"Site\"\nshowcase: true\n---\n# Site\n";
        let server = StubServer::start(vec![("/octo/site/main/README.md", readme)]).await;
        let source = GitHubSource::new(&server.config()).unwrap();

        let body = source.fetch_readme("site", "main").await.unwrap();

        assert_eq!(body, readme);
        assert_eq!(server.requests(), vec!["/octo/site/main/README.md"]);
    }

    #[tokio::test]
    async fn missing_readme_reports_status() {
        let server = StubServer::start(vec![("/octo/site/main/README.md", "# Site\n")]).await;
        let source = GitHubSource::new(&server.config()).unwrap();

        let result = source.fetch_readme("site", "develop").await;

        match result {
            Err(SourceError::Status { url, status }) => {
                assert_eq!(status, 404);
                assert_eq!(url, format!("{}/octo/site/develop/README.md", server.base_url));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
