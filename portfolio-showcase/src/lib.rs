#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod blog;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod frontmatter;
pub mod github;
pub mod portfolio;
pub mod projects;
pub mod source;

pub use blog::{BlogError, BlogPost, BlogStore, Language};
pub use cache::{TtlCache, DEFAULT_TTL};
pub use config::{ConfigError, PortfolioConfig};
pub use fetcher::{fetch_repository_metadata, resolve_branch, DEFAULT_BRANCH, FALLBACK_BRANCHES};
pub use frontmatter::{extract_metadata, ProjectMetadata};
pub use github::GitHubSource;
pub use portfolio::{Portfolio, PortfolioError};
pub use projects::{
    collect_showcase_projects, select_featured, select_showcase, ProjectCatalog,
    RepositoryWithMetadata, FEATURED_ORDERS,
};
pub use source::{Repository, RepositorySource, SourceError};
