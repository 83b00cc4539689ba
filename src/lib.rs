//! Kuchikomi: a catalog review harvester
//!
//! This crate implements a crawler that resolves a keyword to a short ranked
//! product shortlist on an e-commerce catalog, then walks each product's
//! review pages through an explicit state machine, with pacing/backoff,
//! optional authenticated sessions, and rating-based filtering.

pub mod config;
pub mod crawler;
pub mod output;
pub mod pacing;
pub mod records;
pub mod session;

use thiserror::Error;

/// Main error type for kuchikomi operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session could not be initialized: {message}")]
    SessionInit { message: String },

    #[error("Login rejected: invalid credentials")]
    InvalidCredentials,

    #[error("Login interrupted by an anti-automation challenge ({indicator})")]
    AuthChallenge { indicator: String },

    #[error("No search results for keyword \"{keyword}\"")]
    NoResults { keyword: String },

    #[error("Rate limited at {url} after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    #[error("Blocked by the site at {url} ({indicator})")]
    Blocked { url: String, indicator: String },

    #[error("Page load timed out for {url}")]
    PageLoadTimeout { url: String },

    #[error("Could not find {what} at {url}")]
    ElementNotFound { url: String, what: &'static str },

    #[error("Job deadline expired")]
    Cancelled,

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Returns true if this error aborts the whole job rather than a single
    /// product pipeline.
    ///
    /// No session means no work is possible; an empty shortlist leaves
    /// nothing to paginate; and continued requests while blocked only make
    /// the block worse.
    pub fn is_job_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::SessionInit { .. }
                | Self::InvalidCredentials
                | Self::AuthChallenge { .. }
                | Self::NoResults { .. }
                | Self::Blocked { .. }
        )
    }

    /// Short machine-readable tag for the per-product error channel.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::SessionInit { .. } => "session_init",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AuthChallenge { .. } => "auth_challenge",
            Self::NoResults { .. } => "no_results",
            Self::RateLimited { .. } => "rate_limited",
            Self::Blocked { .. } => "blocked",
            Self::PageLoadTimeout { .. } => "page_load_timeout",
            Self::ElementNotFound { .. } => "element_not_found",
            Self::Cancelled => "cancelled",
            Self::Http { .. } => "http",
            Self::UrlParse(_) => "url_parse",
            Self::Export(_) => "export",
            Self::Io(_) => "io",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for kuchikomi operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_job, Orchestrator};
pub use records::{CrawlJob, CrawlOutcome, Credentials, Product, ProductError, Review, StarRating};
pub use session::Session;
