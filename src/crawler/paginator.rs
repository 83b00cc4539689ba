//! Review pagination: the per-product state machine
//!
//! Each shortlisted product gets its own paginator walking the review
//! listing in strictly increasing page order:
//!
//! ```text
//! Idle -> LoadingPage -> Extracting -> Deciding -> Advancing -> LoadingPage
//!                                              \-> Exhausted
//!              \ (retries spent, blocked, or deadline) -> Failed
//! ```
//!
//! `Exhausted` and `Failed` are terminal. Backoff, cancellation, and the
//! page limit are transitions of this machine, not conditions buried in a
//! loop body.

use crate::config::CrawlerConfig;
use crate::crawler::blocked_error;
use crate::crawler::parser::parse_review_page;
use crate::pacing::{classify, BackoffPolicy, Signal};
use crate::records::{CrawlJob, Product, Review, StarRating};
use crate::session::Session;
use crate::{CrawlError, Result};
use std::fmt;
use std::time::Instant;
use url::Url;

/// Phase of one product's pagination machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorPhase {
    /// Cursor initialized, nothing fetched yet
    Idle,

    /// Navigating to the review listing at the cursor's page number
    LoadingPage,

    /// Parsing review entries out of the loaded page
    Extracting,

    /// Filtering, yielding the batch, and choosing the next transition
    Deciding,

    /// Pacing pause before the next page load
    Advancing,

    /// No further pages: the page limit was reached or the next-page
    /// control is gone
    Exhausted,

    /// Terminal failure; the cause is reported through the error channel
    Failed,
}

impl PaginatorPhase {
    /// Returns true if the machine has no outgoing transition left
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed)
    }
}

impl fmt::Display for PaginatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::LoadingPage => "loading_page",
            Self::Extracting => "extracting",
            Self::Deciding => "deciding",
            Self::Advancing => "advancing",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Read cursor over one product's review listing
///
/// Mutated only by the paginator; `page_number` strictly increases and
/// never exceeds the job's page limit.
#[derive(Debug, Clone)]
pub struct PageCursor {
    pub product_rank: u8,
    pub page_number: u32,
    pub has_next: bool,
}

/// State machine walking one product's review pages
pub struct Paginator<'a> {
    session: &'a Session,
    config: &'a CrawlerConfig,
    backoff: BackoffPolicy,
    product: &'a Product,
    star_filter: Option<StarRating>,
    max_pages: u32,
    deadline: Option<Instant>,
    cursor: PageCursor,
    phase: PaginatorPhase,
}

impl<'a> Paginator<'a> {
    pub fn new(
        session: &'a Session,
        config: &'a CrawlerConfig,
        product: &'a Product,
        job: &CrawlJob,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            session,
            config,
            backoff: BackoffPolicy::from_config(config),
            product,
            star_filter: job.star_filter,
            max_pages: job.max_pages,
            deadline,
            cursor: PageCursor {
                product_rank: product.rank,
                page_number: 1,
                has_next: false,
            },
            phase: PaginatorPhase::Idle,
        }
    }

    pub fn phase(&self) -> PaginatorPhase {
        self.phase
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Runs the machine to a terminal phase
    ///
    /// Each page's filtered batch is appended to `sink` as soon as the
    /// Deciding phase yields it, so pages delivered before a later failure
    /// are kept. Returns the failure cause when the terminal phase is
    /// `Failed`.
    pub async fn run(mut self, sink: &mut Vec<Review>) -> Result<()> {
        let asin = match extract_asin(&self.product.url) {
            Some(asin) => asin.to_string(),
            None => {
                return self.fail(CrawlError::ElementNotFound {
                    url: self.product.url.clone(),
                    what: "product id in URL",
                })
            }
        };

        loop {
            self.transition(PaginatorPhase::LoadingPage);
            let body = match self.load_page(&asin).await {
                Ok(body) => body,
                Err(e) => return self.fail(e),
            };

            self.transition(PaginatorPhase::Extracting);
            let parsed = parse_review_page(&body);
            if parsed.skipped > 0 {
                tracing::debug!(
                    "Product #{} page {}: skipped {} incomplete review entries",
                    self.cursor.product_rank,
                    self.cursor.page_number,
                    parsed.skipped
                );
            }

            self.transition(PaginatorPhase::Deciding);
            self.cursor.has_next = parsed.has_next;
            let extracted = parsed.reviews.len();
            let batch: Vec<Review> = parsed
                .reviews
                .into_iter()
                .filter(|review| {
                    self.star_filter
                        .map_or(true, |filter| review.rating == filter.get())
                })
                .map(|review| Review {
                    product_rank: self.cursor.product_rank,
                    title: review.title,
                    text: review.text,
                    rating: review.rating,
                    date: review.date,
                    reviewer_name: review.reviewer_name,
                })
                .collect();
            tracing::info!(
                "Product #{} page {}: kept {}/{} reviews",
                self.cursor.product_rank,
                self.cursor.page_number,
                batch.len(),
                extracted
            );
            sink.extend(batch);

            // A filtered-empty batch still advances; only the page limit or
            // a missing next-page control exhausts the product.
            if self.cursor.page_number >= self.max_pages || !self.cursor.has_next {
                self.transition(PaginatorPhase::Exhausted);
                return Ok(());
            }
            self.cursor.page_number += 1;

            self.transition(PaginatorPhase::Advancing);
            tokio::time::sleep(self.backoff.delay(0)).await;
        }
    }

    /// Loads the review listing at the cursor's page, retrying transient
    /// failures up to the configured attempt bound
    async fn load_page(&mut self, asin: &str) -> Result<String> {
        let url = review_page_url(self.session.base_url(), asin, self.cursor.page_number)?;
        let mut attempts = 0;

        loop {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(CrawlError::Cancelled);
                }
            }

            attempts += 1;
            let fetched = match self.session.fetch_page(url.as_str()).await {
                Ok(fetched) => fetched,
                Err(e @ CrawlError::PageLoadTimeout { .. }) => {
                    if attempts >= self.config.max_attempts {
                        return Err(e);
                    }
                    let delay = self.backoff.delay(attempts);
                    tracing::warn!("Page load timed out, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match classify(fetched.status, &fetched.body) {
                Signal::Blocked => return Err(blocked_error(url.as_str(), &fetched.body)),

                Signal::RateLimited => {
                    if attempts >= self.config.max_attempts {
                        return Err(CrawlError::RateLimited {
                            url: url.to_string(),
                            attempts,
                        });
                    }
                    let delay = self.backoff.delay(attempts);
                    tracing::warn!(
                        "Rate limited on page {} (attempt {}/{}), backing off {:?}",
                        self.cursor.page_number,
                        attempts,
                        self.config.max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }

                Signal::Normal => return Ok(fetched.body),
            }
        }
    }

    fn transition(&mut self, next: PaginatorPhase) {
        tracing::trace!(
            "Product #{} paginator: {} -> {}",
            self.cursor.product_rank,
            self.phase,
            next
        );
        self.phase = next;
    }

    fn fail(&mut self, error: CrawlError) -> Result<()> {
        tracing::warn!(
            "Product #{} paginator failed on page {}: {}",
            self.cursor.product_rank,
            self.cursor.page_number,
            error
        );
        self.transition(PaginatorPhase::Failed);
        Err(error)
    }
}

/// Builds the review listing URL for a product page
fn review_page_url(base: &Url, asin: &str, page_number: u32) -> Result<Url> {
    let mut url = base.join(&format!("/product-reviews/{}/", asin))?;
    url.query_pairs_mut()
        .append_pair("reviewerType", "all_reviews")
        .append_pair("pageNumber", &page_number.to_string());
    Ok(url)
}

/// Extracts the product id out of a catalog product URL
fn extract_asin(url: &str) -> Option<&str> {
    for marker in ["/dp/", "/gp/product/"] {
        if let Some(index) = url.find(marker) {
            let rest = &url[index + marker.len()..];
            let end = rest
                .find(|c: char| c == '/' || c == '?' || c == '#')
                .unwrap_or(rest.len());
            if end > 0 {
                return Some(&rest[..end]);
            }
        }
    }
    None
}
