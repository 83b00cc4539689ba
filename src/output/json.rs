use crate::output::{ExportError, OutputHandler};
use crate::records::{CrawlOutcome, Product, ProductError, Review};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Nested JSON report: each product carries its own reviews, in page order
#[derive(Serialize)]
struct JsonReport<'a> {
    keyword: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    products: Vec<ProductWithReviews<'a>>,
    errors: &'a [ProductError],
}

#[derive(Serialize)]
struct ProductWithReviews<'a> {
    #[serde(flatten)]
    product: &'a Product,
    reviews: Vec<&'a Review>,
}

/// Writes the crawl outcome as one pretty-printed JSON document
pub struct JsonExporter;

impl OutputHandler for JsonExporter {
    fn export(
        &self,
        outcome: &CrawlOutcome,
        directory: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let products = outcome
            .products
            .iter()
            .map(|product| ProductWithReviews {
                product,
                reviews: outcome
                    .reviews
                    .iter()
                    .filter(|review| review.product_rank == product.rank)
                    .collect(),
            })
            .collect();

        let report = JsonReport {
            keyword: &outcome.keyword,
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            products,
            errors: &outcome.errors,
        };

        let path = directory.join(format!("{}.json", stem));
        let file = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(file, &report)?;

        Ok(vec![path])
    }
}
