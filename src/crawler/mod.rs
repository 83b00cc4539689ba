//! Crawl engine: search resolution, review pagination, orchestration
//!
//! This module contains the core crawl logic:
//! - Selector tables for the target site layout
//! - HTML extraction (search tiles, review entries, signin forms)
//! - The search resolver producing the ranked shortlist
//! - The per-product review pagination state machine
//! - The orchestrator sequencing a whole job

mod orchestrator;
mod paginator;
pub mod parser;
mod resolver;
pub mod selectors;

pub use orchestrator::{run_job, Orchestrator};
pub use paginator::{PageCursor, Paginator, PaginatorPhase};
pub use resolver::search;

use crate::pacing::challenge_indicator;
use crate::CrawlError;

/// Builds the job-fatal `Blocked` error for a refused page, naming the
/// indicator that tripped the classification
pub(crate) fn blocked_error(url: &str, body: &str) -> CrawlError {
    let indicator = challenge_indicator(&body.to_lowercase())
        .unwrap_or("challenge page")
        .to_string();
    CrawlError::Blocked {
        url: url.to_string(),
        indicator,
    }
}
