//! CLI for the portfolio data layer.
//!
//! Prints the showcase projects of a GitHub account and the blog posts of a
//! local content directory, the same data the portfolio pages render.

use clap::{Parser, Subcommand};
use portfolio_showcase::{
    BlogPost, Portfolio, PortfolioConfig, PortfolioError, RepositoryWithMetadata,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Portfolio Showcase - Inspect showcase projects and blog posts.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// GitHub account to list repositories for (overrides GITHUB_USERNAME).
    #[arg(long)]
    account: Option<String>,

    /// GitHub Personal Access Token (overrides GITHUB_TOKEN).
    #[arg(long)]
    token: Option<String>,

    /// Directory containing blog posts.
    #[arg(long)]
    blog_dir: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List showcase projects sorted by order.
    Projects,
    /// List featured projects (order 1 to 3).
    Featured,
    /// List blog posts, newest first.
    Posts {
        /// Only posts in this category.
        #[arg(long)]
        category: Option<String>,
        /// Only posts with this tag.
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show a single blog post.
    Post {
        /// Post slug (file name without `.md`).
        slug: String,
    },
    /// List blog categories.
    Categories,
    /// List blog tags.
    Tags,
}

/// How a command finished.
enum Outcome {
    /// Everything requested was produced.
    Complete,
    /// The command ran but some data could not be loaded.
    Incomplete,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    init_tracing();
    install_crypto_provider();

    // Parse arguments
    let args = Args::parse();

    match run(args).await {
        Ok(Outcome::Complete) => ExitCode::from(0),
        Ok(Outcome::Incomplete) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output) on stderr
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Selects aws-lc-rs as the process-wide rustls crypto provider.
fn install_crypto_provider() {
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        debug!("A rustls crypto provider was already installed");
    }
}

/// Builds the configuration: file, then environment, then flags.
fn build_config(args: &Args) -> Result<PortfolioConfig, PortfolioError> {
    let mut config = match &args.config {
        Some(path) => PortfolioConfig::load(path)?,
        None => PortfolioConfig::default(),
    }
    .with_env_overrides();

    if let Some(account) = &args.account {
        config.account = account.clone();
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    if let Some(blog_dir) = &args.blog_dir {
        config.blog_dir = blog_dir.clone();
    }
    Ok(config)
}

/// Main execution logic.
async fn run(args: Args) -> Result<Outcome, PortfolioError> {
    let config = build_config(&args)?;
    let portfolio = Portfolio::new(config)?;

    match &args.command {
        Command::Projects => {
            let projects = match portfolio.projects().try_projects().await {
                Ok(projects) => projects,
                Err(e) => {
                    error!(error = %e, "Failed to fetch projects");
                    return Ok(Outcome::Incomplete);
                }
            };
            print_projects(&projects, args.json);
        }
        Command::Featured => {
            let projects = portfolio.projects().featured_projects().await;
            print_projects(&projects, args.json);
        }
        Command::Posts { category, tag } => {
            let posts: Vec<BlogPost> = portfolio
                .blog()
                .all_posts()?
                .into_iter()
                .filter(|post| category.as_ref().map_or(true, |c| &post.category == c))
                .filter(|post| tag.as_ref().map_or(true, |t| post.tags.contains(t)))
                .collect();
            print_posts(&posts, args.json);
        }
        Command::Post { slug } => match portfolio.blog().post_by_slug(slug) {
            Some(post) => print_post(&post, args.json),
            None => {
                error!(slug = %slug, "Post not found");
                return Ok(Outcome::Incomplete);
            }
        },
        Command::Categories => print_names(&portfolio.blog().categories()?, args.json),
        Command::Tags => print_names(&portfolio.blog().tags()?, args.json),
    }

    Ok(Outcome::Complete)
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => error!(error = %e, "Failed to serialize output"),
    }
}

fn print_projects(projects: &[RepositoryWithMetadata], json: bool) {
    if json {
        print_json(projects);
        return;
    }

    if projects.is_empty() {
        println!("No showcase projects.");
        return;
    }

    for project in projects {
        let Some(metadata) = &project.metadata else {
            continue;
        };
        let title = if metadata.title.is_empty() {
            &project.repository.name
        } else {
            &metadata.title
        };

        println!("[{}] {}", metadata.order, title);
        println!("    {}", project.repository.html_url);
        if !metadata.description.is_empty() {
            println!("    {}", metadata.description);
        }
        if !metadata.technologies.is_empty() {
            println!("    Technologies: {}", metadata.technologies.join(", "));
        }
        for feature in &metadata.features {
            println!("    - {feature}");
        }
    }
}

fn print_posts(posts: &[BlogPost], json: bool) {
    if json {
        print_json(posts);
        return;
    }

    for post in posts {
        println!("{}  {}  ({}, {})", post.date, post.title, post.category, post.read_time);
        println!("    /blog/{}", post.slug);
    }
}

fn print_post(post: &BlogPost, json: bool) {
    if json {
        print_json(post);
        return;
    }

    println!("{}", post.title);
    println!("{} | {} | {}", post.date, post.category, post.read_time);
    if !post.tags.is_empty() {
        println!("Tags: {}", post.tags.join(", "));
    }
    println!();
    println!("{}", post.content);
}

fn print_names(names: &[String], json: bool) {
    if json {
        print_json(names);
        return;
    }

    for name in names {
        println!("{name}");
    }
}
