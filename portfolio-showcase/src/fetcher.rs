//! Per-repository metadata retrieval.
//!
//! Resolves which branch to read, retrieves the README (falling back through
//! a fixed list of branch names) and extracts its front matter. Every failure
//! is logged and collapses to "no metadata".

use crate::frontmatter::{extract_metadata, ProjectMetadata};
use crate::source::RepositorySource;
use tracing::{debug, debug_span, warn, Instrument};

/// Branch assumed when the default branch cannot be determined.
pub const DEFAULT_BRANCH: &str = "main";

/// Branches tried, in order, when the README is missing on the resolved branch.
pub const FALLBACK_BRANCHES: [&str; 3] = ["master", "main", "develop"];

/// Determines which branch to read repository files from.
///
/// Uses the declared default branch, or [`DEFAULT_BRANCH`] if the lookup
/// fails or the host does not report one. Never fails.
pub async fn resolve_branch<S>(source: &S, repo: &str) -> String
where
    S: RepositorySource + ?Sized,
{
    match source.default_branch(repo).await {
        Ok(Some(branch)) if !branch.is_empty() => branch,
        Ok(_) => {
            debug!(repo, "No default branch reported, using '{DEFAULT_BRANCH}'");
            DEFAULT_BRANCH.to_string()
        }
        Err(e) => {
            warn!(
                repo,
                error = %e,
                "Failed to get default branch, using '{DEFAULT_BRANCH}'"
            );
            DEFAULT_BRANCH.to_string()
        }
    }
}

/// Fetches and parses the README metadata of `repo`.
///
/// The resolved branch is tried first, then each of [`FALLBACK_BRANCHES`]
/// except the one already tried, stopping at the first README found.
///
/// # Returns
///
/// The parsed metadata, or `None` if no README could be retrieved or it has
/// no front matter block.
pub async fn fetch_repository_metadata<S>(source: &S, repo: &str) -> Option<ProjectMetadata>
where
    S: RepositorySource + ?Sized,
{
    let span = debug_span!("fetch_metadata", repo);

    async {
        let branch = resolve_branch(source, repo).await;
        let readme = fetch_readme_with_fallback(source, repo, &branch).await?;

        let metadata = extract_metadata(&readme);
        if metadata.is_none() {
            debug!("README has no front matter block");
        }
        metadata
    }
    .instrument(span)
    .await
}

/// Tries `resolved` and then the fallback branches until a README is found.
async fn fetch_readme_with_fallback<S>(source: &S, repo: &str, resolved: &str) -> Option<String>
where
    S: RepositorySource + ?Sized,
{
    let candidates = std::iter::once(resolved).chain(
        FALLBACK_BRANCHES
            .iter()
            .copied()
            .filter(|branch| *branch != resolved),
    );

    for branch in candidates {
        match source.fetch_readme(repo, branch).await {
            Ok(readme) => {
                debug!(branch, "Retrieved README");
                return Some(readme);
            }
            Err(e) => {
                debug!(branch, error = %e, "README not available on branch");
            }
        }
    }

    warn!(repo, "README not found on any branch");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::MockSource;

    const README: &str = "---\ntitle: \"Site\"\nshowcase: true\norder: 1\n---\n# Site";

    #[tokio::test]
    async fn resolves_declared_default_branch() {
        let source = MockSource::new().with_default_branch("site", "trunk");
        assert_eq!(resolve_branch(&source, "site").await, "trunk");
    }

    #[tokio::test]
    async fn resolve_falls_back_to_main_on_failure() {
        let source = MockSource::new();
        assert_eq!(resolve_branch(&source, "site").await, "main");
    }

    #[tokio::test]
    async fn resolve_falls_back_to_main_on_empty_branch() {
        let source = MockSource::new().with_default_branch("site", "");
        assert_eq!(resolve_branch(&source, "site").await, "main");
    }

    #[tokio::test]
    async fn reads_readme_from_default_branch() {
        let source = MockSource::new()
            .with_default_branch("site", "trunk")
            .with_readme("site", "trunk", README);

        let metadata = fetch_repository_metadata(&source, "site").await.unwrap();

        assert_eq!(metadata.title, "Site");
        assert_eq!(source.readme_requests("site"), vec!["trunk"]);
    }

    #[tokio::test]
    async fn default_branch_failure_still_finds_main() {
        let source = MockSource::new().with_readme("site", "main", README);

        let metadata = fetch_repository_metadata(&source, "site").await;

        assert!(metadata.is_some());
        assert_eq!(source.readme_requests("site"), vec!["main"]);
    }

    #[tokio::test]
    async fn falls_back_through_branches_skipping_resolved() {
        let source = MockSource::new()
            .with_default_branch("site", "main")
            .with_readme("site", "develop", README);

        let metadata = fetch_repository_metadata(&source, "site").await;

        assert!(metadata.is_some());
        assert_eq!(
            source.readme_requests("site"),
            vec!["main", "master", "develop"]
        );
    }

    #[tokio::test]
    async fn stops_at_first_successful_fallback() {
        let source = MockSource::new()
            .with_default_branch("site", "gh-pages")
            .with_readme("site", "master", README)
            .with_readme("site", "main", "---\ntitle: \"Other\"\n---");

        let metadata = fetch_repository_metadata(&source, "site").await.unwrap();

        assert_eq!(metadata.title, "Site");
        assert_eq!(source.readme_requests("site"), vec!["gh-pages", "master"]);
    }

    #[tokio::test]
    async fn exhausted_branches_yield_none() {
        let source = MockSource::new().with_default_branch("site", "trunk");

        assert_eq!(fetch_repository_metadata(&source, "site").await, None);
        assert_eq!(
            source.readme_requests("site"),
            vec!["trunk", "master", "main", "develop"]
        );
    }

    #[tokio::test]
    async fn readme_without_front_matter_yields_none() {
        let source = MockSource::new().with_readme("site", "main", "# Just a readme");
        assert_eq!(fetch_repository_metadata(&source, "site").await, None);
    }
}
