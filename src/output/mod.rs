//! Export of crawl outcomes and the end-of-run summary
//!
//! This module handles:
//! - JSON export (nested products-with-reviews report)
//! - CSV export (flat review rows with product context, plus the shortlist)
//! - Run statistics and the printed summary, including the per-product
//!   error list

mod csv;
mod json;
mod stats;

pub use self::csv::CsvExporter;
pub use json::JsonExporter;
pub use stats::{collect_statistics, print_summary, ProductCount, RunStatistics};

use crate::config::{OutputConfig, OutputFormat};
use crate::records::CrawlOutcome;
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// An export format writing a crawl outcome under a directory
pub trait OutputHandler {
    /// Writes the outcome, returning the paths created
    fn export(
        &self,
        outcome: &CrawlOutcome,
        directory: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>, ExportError>;
}

/// Writes the configured export formats for one outcome
///
/// Creates the output directory on demand and names files
/// `reviews_<keyword>_<timestamp>.*`.
pub fn write_outputs(
    outcome: &CrawlOutcome,
    config: &OutputConfig,
) -> Result<Vec<PathBuf>, ExportError> {
    let directory = Path::new(&config.directory);
    std::fs::create_dir_all(directory)?;

    let stem = format!(
        "reviews_{}_{}",
        sanitize_stem(&outcome.keyword),
        Utc::now().format("%Y%m%d_%H%M%S")
    );

    let handlers: Vec<Box<dyn OutputHandler>> = match config.format {
        OutputFormat::Json => vec![Box::new(JsonExporter)],
        OutputFormat::Csv => vec![Box::new(CsvExporter)],
        OutputFormat::Both => vec![Box::new(JsonExporter), Box::new(CsvExporter)],
    };

    let mut paths = Vec::new();
    for handler in handlers {
        paths.extend(handler.export(outcome, directory, &stem)?);
    }
    Ok(paths)
}

fn sanitize_stem(keyword: &str) -> String {
    keyword
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
