//! Run statistics and the end-of-run summary
//!
//! This module aggregates the counts the summary prints: reviews per
//! product, the star-rating distribution, and the per-product error list.

use crate::records::CrawlOutcome;

/// Summary statistics for one crawl run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Number of shortlisted products
    pub total_products: usize,

    /// Number of reviews kept after filtering
    pub total_reviews: usize,

    /// Review count per product, in rank order
    pub reviews_by_product: Vec<ProductCount>,

    /// Review counts indexed by star rating; slot 0 holds 1-star counts
    pub star_distribution: [usize; 5],

    /// Number of products whose paginator failed
    pub failed_products: usize,
}

/// Review count for one shortlisted product
#[derive(Debug, Clone)]
pub struct ProductCount {
    pub rank: u8,
    pub title: String,
    pub reviews: usize,
}

/// Builds the statistics for a crawl outcome
pub fn collect_statistics(outcome: &CrawlOutcome) -> RunStatistics {
    let mut star_distribution = [0usize; 5];
    for review in &outcome.reviews {
        if (1..=5).contains(&review.rating) {
            star_distribution[review.rating as usize - 1] += 1;
        }
    }

    let reviews_by_product = outcome
        .products
        .iter()
        .map(|product| ProductCount {
            rank: product.rank,
            title: product.title.clone(),
            reviews: outcome
                .reviews
                .iter()
                .filter(|review| review.product_rank == product.rank)
                .count(),
        })
        .collect();

    RunStatistics {
        total_products: outcome.products.len(),
        total_reviews: outcome.reviews.len(),
        reviews_by_product,
        star_distribution,
        failed_products: outcome.errors.len(),
    }
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(outcome: &CrawlOutcome) {
    let stats = collect_statistics(outcome);

    println!("=== Crawl Summary ===");
    println!("Keyword: {}", outcome.keyword);
    println!(
        "Duration: {}s",
        (outcome.finished_at - outcome.started_at).num_seconds()
    );

    println!("Products: {}", stats.total_products);
    for product in &stats.reviews_by_product {
        println!(
            "  #{} {}: {} reviews",
            product.rank, product.title, product.reviews
        );
    }

    println!("Total reviews: {}", stats.total_reviews);
    if stats.total_reviews > 0 {
        println!("Star distribution:");
        for (index, count) in stats.star_distribution.iter().enumerate().rev() {
            if *count > 0 {
                let percentage = (*count as f64 / stats.total_reviews as f64) * 100.0;
                println!("  {} stars: {} ({:.1}%)", index + 1, count, percentage);
            }
        }
    }

    if outcome.errors.is_empty() {
        println!("Errors: none");
    } else {
        println!("Errors ({}):", outcome.errors.len());
        for error in &outcome.errors {
            println!(
                "  product #{}: [{}] {}",
                error.product_rank, error.kind, error.message
            );
        }
    }
}
