//! Core data records shared across the crawl pipeline
//!
//! This module defines the immutable job description, the product and
//! review records the crawl emits, and the per-product error channel.

use crate::session::StoredCookie;
use crate::{ConfigError, CrawlError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A star rating in 1..=5, used both on reviews and as the job filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StarRating(u8);

impl StarRating {
    /// Creates a star rating, returning None outside 1..=5
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for StarRating {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            ConfigError::Validation(format!("star filter must be in 1..=5, got {}", value))
        })
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Description of one crawl run, immutable once the orchestrator starts
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Keyword submitted to the catalog search endpoint
    pub keyword: String,

    /// Keep only reviews with exactly this rating; None keeps everything
    pub star_filter: Option<StarRating>,

    /// Maximum review pages to walk per product
    pub max_pages: u32,

    /// Shortlist size, at most 3
    pub top_count: u32,

    /// Whether to authenticate before searching
    pub use_login: bool,

    /// Optional wall-clock budget for the whole job
    pub deadline: Option<Duration>,
}

impl CrawlJob {
    /// Validates the job limits before the orchestrator starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keyword must not be empty".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Validation(
                "max-pages must be at least 1".to_string(),
            ));
        }
        if !(1..=3).contains(&self.top_count) {
            return Err(ConfigError::Validation(format!(
                "top-count must be in 1..=3, got {}",
                self.top_count
            )));
        }
        Ok(())
    }
}

/// Login credentials, consumed only by `Session::login`
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// One shortlisted product from the search results
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Position in the shortlist, 1..=3, unique within a job
    pub rank: u8,

    pub title: String,

    /// Canonical product URL
    pub url: String,

    /// Displayed price, extracted best-effort
    pub price: Option<String>,

    /// Displayed aggregate rating text, extracted best-effort
    pub rating: Option<String>,
}

/// One extracted customer review
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    /// Rank of the product this review belongs to
    pub product_rank: u8,

    pub title: String,

    pub text: String,

    /// Star rating in 1..=5
    pub rating: u8,

    /// Review date as displayed on the page
    pub date: String,

    pub reviewer_name: String,
}

/// Error record for a product whose paginator reached its failed state
#[derive(Debug, Clone, Serialize)]
pub struct ProductError {
    pub product_rank: u8,
    pub kind: &'static str,
    pub message: String,
}

impl ProductError {
    pub fn from_error(product_rank: u8, error: &CrawlError) -> Self {
        Self {
            product_rank,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Aggregated result of one crawl run
///
/// Reviews are grouped by `product_rank` in shortlist order, and within a
/// product they preserve page order and on-page display order. A run that
/// failed on some products carries those failures in `errors` next to the
/// successes; nothing is dropped silently.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub keyword: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub reviews: Vec<Review>,
    pub errors: Vec<ProductError>,

    /// Final cookie snapshot for an external persistence collaborator.
    /// Never serialized into data exports.
    #[serde(skip)]
    pub session_cookies: Vec<StoredCookie>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> CrawlJob {
        CrawlJob {
            keyword: "wireless headphones".to_string(),
            star_filter: None,
            max_pages: 2,
            top_count: 3,
            use_login: false,
            deadline: None,
        }
    }

    #[test]
    fn test_star_rating_bounds() {
        assert!(StarRating::new(0).is_none());
        assert!(StarRating::new(6).is_none());
        for value in 1..=5 {
            assert_eq!(StarRating::new(value).unwrap().get(), value);
        }
    }

    #[test]
    fn test_star_rating_try_from() {
        assert!(StarRating::try_from(5).is_ok());
        assert!(matches!(
            StarRating::try_from(7),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_valid_job() {
        assert!(job().validate().is_ok());
    }

    #[test]
    fn test_job_rejects_empty_keyword() {
        let mut j = job();
        j.keyword = "   ".to_string();
        assert!(j.validate().is_err());
    }

    #[test]
    fn test_job_rejects_zero_pages() {
        let mut j = job();
        j.max_pages = 0;
        assert!(j.validate().is_err());
    }

    #[test]
    fn test_job_rejects_oversized_shortlist() {
        let mut j = job();
        j.top_count = 4;
        assert!(j.validate().is_err());
        j.top_count = 0;
        assert!(j.validate().is_err());
    }

    #[test]
    fn test_product_error_from_error() {
        let err = CrawlError::RateLimited {
            url: "https://example.com/product-reviews/B01".to_string(),
            attempts: 3,
        };
        let record = ProductError::from_error(2, &err);
        assert_eq!(record.product_rank, 2);
        assert_eq!(record.kind, "rate_limited");
        assert!(record.message.contains("3 attempts"));
    }
}
