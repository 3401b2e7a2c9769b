//! Showcase project aggregation.
//!
//! Lists every repository of the account, fetches README metadata for all of
//! them concurrently, and keeps the ones that opted into the showcase, sorted
//! by their declared order. [`ProjectCatalog`] puts the result behind a
//! [`TtlCache`].

use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::fetcher::fetch_repository_metadata;
use crate::frontmatter::ProjectMetadata;
use crate::source::{Repository, RepositorySource, SourceError};
use futures::future::join_all;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{error, info, info_span, Instrument};

/// Cache key of the aggregated showcase list.
pub const PROJECTS_CACHE_KEY: &str = "projects";

/// Orders that qualify a showcase project as featured.
pub const FEATURED_ORDERS: RangeInclusive<u32> = 1..=3;

/// A repository paired with the metadata parsed from its README.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryWithMetadata {
    /// The repository as listed by the host.
    #[serde(flatten)]
    pub repository: Repository,

    /// Parsed metadata, absent if the README had no front matter.
    pub metadata: Option<ProjectMetadata>,
}

impl RepositoryWithMetadata {
    /// Returns true if the metadata opts this repository into the showcase.
    #[must_use]
    pub fn is_showcase(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.showcase)
    }

    /// Returns the declared order, `0` when there is none.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.metadata.as_ref().map_or(0, |m| m.order)
    }

    /// Returns true if the project has an explicit order within [`FEATURED_ORDERS`].
    ///
    /// Order `0` doubles as "no order given" and is never featured.
    #[must_use]
    pub fn is_featured(&self) -> bool {
        FEATURED_ORDERS.contains(&self.order())
    }
}

/// Builds the showcase list from the source, bypassing any cache.
///
/// Per-repository failures only drop that repository; the listing call is
/// the only failure that reaches the caller.
///
/// # Errors
///
/// Returns [`SourceError`] if the repositories cannot be listed.
pub async fn collect_showcase_projects<S>(
    source: &S,
) -> Result<Vec<RepositoryWithMetadata>, SourceError>
where
    S: RepositorySource + ?Sized,
{
    let span = info_span!("collect_projects");

    async {
        let repositories = source.list_repositories().await?;
        info!(count = repositories.len(), "Fetching repository metadata");

        let records = join_all(repositories.into_iter().map(|repository| async move {
            let metadata = fetch_repository_metadata(source, &repository.name).await;
            RepositoryWithMetadata {
                repository,
                metadata,
            }
        }))
        .await;

        let projects = select_showcase(records);
        info!(count = projects.len(), "Collected showcase projects");
        Ok(projects)
    }
    .instrument(span)
    .await
}

/// Keeps showcase records and sorts them by order.
///
/// The sort is stable, so equal orders keep their listing order.
#[must_use]
pub fn select_showcase(records: Vec<RepositoryWithMetadata>) -> Vec<RepositoryWithMetadata> {
    let mut projects: Vec<_> = records
        .into_iter()
        .filter(RepositoryWithMetadata::is_showcase)
        .collect();
    projects.sort_by_key(RepositoryWithMetadata::order);
    projects
}

/// Returns the featured subset of a showcase list, preserving its order.
#[must_use]
pub fn select_featured(projects: &[RepositoryWithMetadata]) -> Vec<RepositoryWithMetadata> {
    projects
        .iter()
        .filter(|project| project.is_featured())
        .cloned()
        .collect()
}

/// Cached access to the showcase projects of a repository source.
pub struct ProjectCatalog<S> {
    source: S,
    cache: TtlCache<Vec<RepositoryWithMetadata>>,
}

impl<S: RepositorySource> ProjectCatalog<S> {
    /// Creates a catalog whose aggregate stays fresh for `ttl`.
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl),
        }
    }

    /// Creates a catalog with the default one hour freshness window.
    pub fn with_default_ttl(source: S) -> Self {
        Self::new(source, DEFAULT_TTL)
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the showcase projects, refreshing them if stale.
    ///
    /// A failed refresh is not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the repositories cannot be listed.
    pub async fn try_projects(&self) -> Result<Vec<RepositoryWithMetadata>, SourceError> {
        self.cache
            .try_get_or_compute(PROJECTS_CACHE_KEY, self.cache.default_ttl(), || {
                collect_showcase_projects(&self.source)
            })
            .await
    }

    /// Returns the showcase projects, or an empty list if they cannot be
    /// listed.
    pub async fn projects(&self) -> Vec<RepositoryWithMetadata> {
        match self.try_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                error!(error = %e, "Failed to fetch projects");
                Vec::new()
            }
        }
    }

    /// Returns the showcase projects whose order is within [`FEATURED_ORDERS`].
    pub async fn featured_projects(&self) -> Vec<RepositoryWithMetadata> {
        select_featured(&self.projects().await)
    }
}
