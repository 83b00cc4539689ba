//! Crawl orchestration: one session, one shortlist, sequential paginators
//!
//! The orchestrator owns the whole run: it opens the session, optionally
//! authenticates, resolves the shortlist, and walks each product's review
//! pages in rank order. One product's failure is recorded and never stops
//! its siblings; job-fatal conditions abort the run with context. The
//! session is released on every exit path.

use crate::config::Config;
use crate::crawler::paginator::Paginator;
use crate::crawler::resolver::search;
use crate::records::{CrawlJob, CrawlOutcome, Credentials, ProductError, Review};
use crate::session::{Session, StoredCookie};
use crate::{ConfigError, CrawlError, Result};
use chrono::Utc;
use std::time::Instant;

/// Runs crawl jobs against one configuration
pub struct Orchestrator {
    config: Config,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs a crawl job to completion
    ///
    /// `credentials` are consumed only when the job requests login;
    /// `cookies` is an optional snapshot from a previous session, replayed
    /// before any navigation. The outcome carries the final snapshot back
    /// for the external persistence collaborator.
    pub async fn run(
        &self,
        job: &CrawlJob,
        credentials: Option<&Credentials>,
        cookies: Option<&[StoredCookie]>,
    ) -> Result<CrawlOutcome> {
        job.validate()?;
        if job.use_login && credentials.is_none() {
            return Err(CrawlError::Config(ConfigError::Validation(
                "login requested but no credentials supplied".to_string(),
            )));
        }

        let started_at = Utc::now();
        let deadline = job.deadline.map(|budget| Instant::now() + budget);
        tracing::info!(
            "Starting crawl for \"{}\" (top {}, {} pages/product, filter: {})",
            job.keyword,
            job.top_count,
            job.max_pages,
            job.star_filter
                .map_or("none".to_string(), |f| f.to_string()),
        );

        let mut session = Session::open(&self.config)?;
        if let Some(cookies) = cookies {
            session.import_cookies(cookies);
        }

        // Wrong credentials abort here, before any search is attempted
        if job.use_login {
            if let Some(credentials) = credentials {
                session.login(credentials).await?;
            }
        }

        let products = search(&session, &self.config.crawler, &job.keyword, job.top_count).await?;

        let mut reviews: Vec<Review> = Vec::new();
        let mut errors: Vec<ProductError> = Vec::new();
        let mut cancelled = false;

        for product in &products {
            if cancelled {
                // Remaining work after deadline expiry is reported, not
                // silently dropped
                errors.push(ProductError {
                    product_rank: product.rank,
                    kind: "cancelled",
                    message: "job deadline expired before this product was processed".to_string(),
                });
                continue;
            }

            tracing::info!("Collecting reviews for #{} {}", product.rank, product.title);
            let paginator =
                Paginator::new(&session, &self.config.crawler, product, job, deadline);

            match paginator.run(&mut reviews).await {
                Ok(()) => {}
                Err(e @ CrawlError::Blocked { .. }) => {
                    // Continuing to request while blocked only worsens the
                    // situation; abort the whole job
                    session.close();
                    return Err(e);
                }
                Err(e) => {
                    if matches!(e, CrawlError::Cancelled) {
                        cancelled = true;
                    }
                    errors.push(ProductError::from_error(product.rank, &e));
                }
            }
        }

        let session_cookies = session.export_cookies();
        session.close();

        tracing::info!(
            "Crawl finished: {} products, {} reviews, {} errors",
            products.len(),
            reviews.len(),
            errors.len()
        );

        Ok(CrawlOutcome {
            keyword: job.keyword.clone(),
            started_at,
            finished_at: Utc::now(),
            products,
            reviews,
            errors,
            session_cookies,
        })
    }
}

/// Convenience entry point for one-shot runs
pub async fn run_job(
    config: Config,
    job: &CrawlJob,
    credentials: Option<&Credentials>,
) -> Result<CrawlOutcome> {
    Orchestrator::new(config).run(job, credentials, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> CrawlJob {
        CrawlJob {
            keyword: "x".to_string(),
            star_filter: None,
            max_pages: 1,
            top_count: 3,
            use_login: false,
            deadline: None,
        }
    }

    #[tokio::test]
    async fn test_login_without_credentials_is_rejected() {
        let orchestrator = Orchestrator::new(Config::default());
        let mut j = job();
        j.use_login = true;

        let result = orchestrator.run(&j, None, None).await;
        assert!(matches!(
            result,
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_job_is_rejected_before_any_session() {
        let orchestrator = Orchestrator::new(Config::default());
        let mut j = job();
        j.max_pages = 0;

        let result = orchestrator.run(&j, None, None).await;
        assert!(matches!(result, Err(CrawlError::Config(_))));
    }
}
