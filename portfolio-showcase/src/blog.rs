//! Markdown blog posts loaded from disk.
//!
//! Every `*.md` file in the blog directory is one post; its slug is the file
//! stem. A post starts with a YAML front matter block:
//!
//! ```text
//! ---
//! title: "Async Rust in practice"
//! date: "2024-03-01"
//! category: "Rust"
//! readTime: "6 min"
//! description: "Notes from a year of tokio"
//! tags: ["rust", "async"]
//! language: "en"
//! ---
//! Post body...
//! ```

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Extension of post files.
const POST_EXTENSION: &str = "md";

/// Errors that can occur while loading blog posts.
#[derive(Debug, Error)]
pub enum BlogError {
    /// Failed to read a file or directory.
    #[error("Failed to read '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Post does not start with a front matter block.
    #[error("Missing front matter in '{path}'")]
    MissingFrontMatter { path: String },

    /// Front matter is not valid YAML for a post.
    #[error("Failed to parse front matter in '{path}': {source}")]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Slug cannot name a post file.
    #[error("Invalid post slug: {slug}")]
    InvalidSlug { slug: String },
}

/// Language a post is written in. Unknown codes read as English.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Tr,
    #[default]
    #[serde(other)]
    En,
}

/// Header fields of a post file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PostFrontMatter {
    title: String,
    date: String,
    category: String,
    read_time: String,
    description: String,
    tags: Vec<String>,
    language: Language,
}

/// A blog post with its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    /// Publication date as written in the front matter.
    pub date: String,
    pub category: String,
    pub read_time: String,
    pub description: String,
    pub tags: Vec<String>,
    pub language: Language,
    /// Markdown body following the front matter.
    pub content: String,
}

impl BlogPost {
    /// Returns the parsed publication date.
    ///
    /// Accepts `YYYY-MM-DD` and RFC 3339 timestamps.
    #[must_use]
    pub fn published_on(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(date)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Reads blog posts from a directory.
#[derive(Debug, Clone)]
pub struct BlogStore {
    dir: PathBuf,
}

impl BlogStore {
    /// Creates a store reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the posts directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads every post, newest first.
    ///
    /// Posts whose date cannot be parsed are placed last.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError`] if the directory or any post cannot be read or
    /// parsed.
    pub fn all_posts(&self) -> Result<Vec<BlogPost>, BlogError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| BlogError::IoError {
            path: self.dir.display().to_string(),
            source: e,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BlogError::IoError {
                path: self.dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == POST_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut posts = paths
            .iter()
            .map(|path| read_post(path))
            .collect::<Result<Vec<_>, _>>()?;

        posts.sort_by(|a, b| b.published_on().cmp(&a.published_on()));
        debug!(dir = %self.dir.display(), count = posts.len(), "Loaded blog posts");
        Ok(posts)
    }

    /// Loads the post named `slug`.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::InvalidSlug`] for slugs containing path
    /// separators or `..`, otherwise any read or parse error.
    pub fn load_post(&self, slug: &str) -> Result<BlogPost, BlogError> {
        if !is_valid_slug(slug) {
            return Err(BlogError::InvalidSlug {
                slug: slug.to_string(),
            });
        }

        let path = self.dir.join(format!("{slug}.{POST_EXTENSION}"));
        read_post(&path)
    }

    /// Loads the post named `slug`, or `None` if it cannot be loaded.
    pub fn post_by_slug(&self, slug: &str) -> Option<BlogPost> {
        match self.load_post(slug) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!(slug, error = %e, "Failed to load post");
                None
            }
        }
    }

    /// Returns the distinct categories in post order.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError`] if the posts cannot be loaded.
    pub fn categories(&self) -> Result<Vec<String>, BlogError> {
        let posts = self.all_posts()?;
        Ok(distinct(posts.into_iter().map(|post| post.category)))
    }

    /// Returns the distinct tags in post order.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError`] if the posts cannot be loaded.
    pub fn tags(&self) -> Result<Vec<String>, BlogError> {
        let posts = self.all_posts()?;
        Ok(distinct(posts.into_iter().flat_map(|post| post.tags)))
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.contains(['/', '\\']) && !slug.contains("..")
}

/// Deduplicates while keeping first occurrences in order.
fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(value.clone())).collect()
}

fn read_post(path: &Path) -> Result<BlogPost, BlogError> {
    let content = std::fs::read_to_string(path).map_err(|e| BlogError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let slug = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();

    parse_post(&slug, &content).map_err(|e| match e {
        ParseFailure::MissingFrontMatter => BlogError::MissingFrontMatter {
            path: path.display().to_string(),
        },
        ParseFailure::Yaml(source) => BlogError::YamlError {
            path: path.display().to_string(),
            source,
        },
    })
}

/// Why a post body could not be parsed.
#[derive(Debug)]
enum ParseFailure {
    MissingFrontMatter,
    Yaml(serde_yaml::Error),
}

fn parse_post(slug: &str, content: &str) -> Result<BlogPost, ParseFailure> {
    let (header, body) = split_front_matter(content).ok_or(ParseFailure::MissingFrontMatter)?;
    let front: PostFrontMatter = if header.trim().is_empty() {
        PostFrontMatter::default()
    } else {
        serde_yaml::from_str(header).map_err(ParseFailure::Yaml)?
    };

    Ok(BlogPost {
        slug: slug.to_string(),
        title: front.title,
        date: front.date,
        category: front.category,
        read_time: front.read_time,
        description: front.description,
        tags: front.tags,
        language: front.language,
        content: body.to_string(),
    })
}

/// Splits a post into its front matter and body.
///
/// The file must open with a `---` line; the block ends at the next `---`
/// line.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (first, rest) = content.split_once('\n')?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}
