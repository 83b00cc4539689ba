//! Kuchikomi main entry point
//!
//! Command-line interface for the catalog review harvester: resolves a
//! keyword to a product shortlist, collects reviews page by page, and
//! exports the outcome as JSON/CSV.

use anyhow::{bail, Context};
use clap::Parser;
use kuchikomi::config::{default_config, load_config, OutputFormat};
use kuchikomi::output::{print_summary, write_outputs};
use kuchikomi::records::{CrawlJob, Credentials, StarRating};
use kuchikomi::session::StoredCookie;
use kuchikomi::Orchestrator;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Kuchikomi: a catalog review harvester
///
/// Searches the catalog for a keyword, shortlists the top products, and
/// walks their review pages with pacing, bounded retries, and optional
/// login.
#[derive(Parser, Debug)]
#[command(name = "kuchikomi")]
#[command(version = "1.0.0")]
#[command(about = "A catalog review harvester", long_about = None)]
struct Cli {
    /// Product keyword to search for
    #[arg(value_name = "KEYWORD")]
    keyword: String,

    /// Keep only reviews with this star rating (1-5)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    star_filter: Option<u8>,

    /// Maximum review pages to walk per product
    #[arg(long, default_value_t = 2)]
    max_pages: u32,

    /// Number of top products to shortlist (1-3)
    #[arg(long, default_value_t = 3)]
    top_count: u32,

    /// Log in before crawling (reads KUCHIKOMI_EMAIL and KUCHIKOMI_PASSWORD)
    #[arg(long)]
    login: bool,

    /// Abort the job after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured output format
    #[arg(long, value_enum)]
    output_format: Option<OutputFormat>,

    /// Override the configured output directory
    #[arg(long)]
    output_dir: Option<String>,

    /// Restore and save session cookies at this path
    #[arg(long)]
    cookie_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => default_config(),
    };
    if let Some(format) = cli.output_format {
        config.output.format = format;
    }
    if let Some(directory) = &cli.output_dir {
        config.output.directory = directory.clone();
    }

    let star_filter = cli
        .star_filter
        .map(StarRating::try_from)
        .transpose()
        .context("invalid star filter")?;

    let job = CrawlJob {
        keyword: cli.keyword.clone(),
        star_filter,
        max_pages: cli.max_pages,
        top_count: cli.top_count,
        use_login: cli.login,
        deadline: cli.deadline_secs.map(Duration::from_secs),
    };

    let credentials = if cli.login {
        Some(load_credentials()?)
    } else {
        None
    };

    let cookies = match &cli.cookie_file {
        Some(path) if path.exists() => Some(load_cookie_file(path)?),
        _ => None,
    };

    let orchestrator = Orchestrator::new(config.clone());
    let outcome = orchestrator
        .run(&job, credentials.as_ref(), cookies.as_deref())
        .await?;

    print_summary(&outcome);

    let paths = write_outputs(&outcome, &config.output)?;
    for path in &paths {
        println!("Saved: {}", path.display());
    }

    if let Some(path) = &cli.cookie_file {
        save_cookie_file(path, &outcome.session_cookies)?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kuchikomi=info,warn"),
            1 => EnvFilter::new("kuchikomi=debug,info"),
            2 => EnvFilter::new("kuchikomi=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads login credentials from the environment (or `.env`)
fn load_credentials() -> anyhow::Result<Credentials> {
    let email = std::env::var("KUCHIKOMI_EMAIL").ok();
    let password = std::env::var("KUCHIKOMI_PASSWORD").ok();
    match (email, password) {
        (Some(email), Some(password)) => Ok(Credentials { email, password }),
        _ => bail!("KUCHIKOMI_EMAIL and KUCHIKOMI_PASSWORD must be set for --login"),
    }
}

fn load_cookie_file(path: &Path) -> anyhow::Result<Vec<StoredCookie>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cookie file {}", path.display()))?;
    let cookies: Vec<StoredCookie> =
        serde_json::from_str(&content).context("cookie file is not valid JSON")?;
    tracing::info!("Restored {} cookies from {}", cookies.len(), path.display());
    Ok(cookies)
}

fn save_cookie_file(path: &Path, cookies: &[StoredCookie]) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(cookies)?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write cookie file {}", path.display()))?;
    tracing::info!("Saved {} cookies to {}", cookies.len(), path.display());
    Ok(())
}
