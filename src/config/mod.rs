//! Configuration module for kuchikomi
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. All sections have defaults, so running without a config file is
//! supported.
//!
//! # Example
//!
//! ```no_run
//! use kuchikomi::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("kuchikomi.toml")).unwrap();
//! println!("Crawling {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, OutputFormat, SessionConfig, SiteConfig};

// Re-export parser functions
pub use parser::{default_config, load_config};

// Re-export validation
pub use validation::validate;
