//! Search resolution: keyword → ranked product shortlist
//!
//! Issues one query against the catalog's search endpoint, waits out the
//! result list with a bounded fetch budget, and ranks the first distinct
//! results in display order. An empty outcome is reported as `NoResults`
//! rather than retried at job level, since a different keyword is unlikely
//! to need the same query again.

use crate::config::CrawlerConfig;
use crate::crawler::blocked_error;
use crate::crawler::parser::{parse_search_results, ProductTile};
use crate::crawler::selectors;
use crate::pacing::{classify, BackoffPolicy, Signal};
use crate::records::Product;
use crate::session::Session;
use crate::{CrawlError, Result};
use std::collections::HashSet;
use url::Url;

/// Resolves a keyword to an ordered shortlist of at most `top_count` products
///
/// Ranks are assigned 1..=N by display order after deduplicating by
/// product URL.
pub async fn search(
    session: &Session,
    config: &CrawlerConfig,
    keyword: &str,
    top_count: u32,
) -> Result<Vec<Product>> {
    let url = search_url(session.base_url(), keyword)?;
    let backoff = BackoffPolicy::from_config(config);
    tracing::info!("Searching for \"{}\" at {}", keyword, url);

    let mut rate_attempts = 0;
    let mut render_attempts = 0;
    loop {
        let page = session.fetch_page(url.as_str()).await?;

        match classify(page.status, &page.body) {
            Signal::Blocked => return Err(blocked_error(url.as_str(), &page.body)),

            Signal::RateLimited => {
                rate_attempts += 1;
                if rate_attempts >= config.max_attempts {
                    return Err(CrawlError::RateLimited {
                        url: url.to_string(),
                        attempts: rate_attempts,
                    });
                }
                let delay = backoff.delay(rate_attempts);
                tracing::warn!("Search rate limited, backing off {:?}", delay);
                tokio::time::sleep(delay).await;
            }

            Signal::Normal => {
                let tiles = parse_search_results(&page.body, session.base_url());
                if tiles.is_empty() {
                    // The result list may not have rendered yet; spend the
                    // remaining fetch budget before reporting no results.
                    render_attempts += 1;
                    if render_attempts >= config.render_attempts {
                        return Err(CrawlError::NoResults {
                            keyword: keyword.to_string(),
                        });
                    }
                    tracing::debug!(
                        "No result tiles yet (attempt {}/{})",
                        render_attempts,
                        config.render_attempts
                    );
                    tokio::time::sleep(backoff.delay(0)).await;
                    continue;
                }

                let shortlist = rank_shortlist(tiles, top_count);
                tracing::info!("Shortlisted {} products", shortlist.len());
                for product in &shortlist {
                    tracing::debug!("  #{} {} ({})", product.rank, product.title, product.url);
                }
                return Ok(shortlist);
            }
        }
    }
}

/// Deduplicates tiles by URL and assigns ranks 1..=N in display order
fn rank_shortlist(tiles: Vec<ProductTile>, top_count: u32) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut shortlist = Vec::new();

    for tile in tiles {
        if !seen.insert(tile.url.to_string()) {
            continue;
        }
        let rank = shortlist.len() as u8 + 1;
        shortlist.push(Product {
            rank,
            title: tile.title,
            url: tile.url.into(),
            price: tile.price,
            rating: tile.rating,
        });
        if shortlist.len() as u32 == top_count {
            break;
        }
    }
    shortlist
}

/// Builds the search endpoint URL for a keyword
fn search_url(base: &Url, keyword: &str) -> Result<Url> {
    let mut url = base.join(selectors::SEARCH_PATH)?;
    url.query_pairs_mut().append_pair("k", keyword);
    Ok(url)
}
