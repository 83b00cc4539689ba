use crate::output::{ExportError, OutputHandler};
use crate::records::CrawlOutcome;
use std::path::{Path, PathBuf};

/// Writes the crawl outcome as flat CSV files: one for reviews (with their
/// product context joined in) and one for the shortlist itself
pub struct CsvExporter;

impl OutputHandler for CsvExporter {
    fn export(
        &self,
        outcome: &CrawlOutcome,
        directory: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let reviews_path = directory.join(format!("{}.csv", stem));
        let products_path = directory.join(format!("{}_products.csv", stem));

        write_reviews(outcome, &reviews_path)?;
        write_products(outcome, &products_path)?;

        Ok(vec![reviews_path, products_path])
    }
}

fn write_reviews(outcome: &CrawlOutcome, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "product_rank",
        "product_title",
        "product_url",
        "review_title",
        "rating",
        "date",
        "reviewer_name",
        "text",
    ])?;

    for review in &outcome.reviews {
        let product = outcome
            .products
            .iter()
            .find(|p| p.rank == review.product_rank);
        writer.write_record([
            review.product_rank.to_string().as_str(),
            product.map_or("", |p| p.title.as_str()),
            product.map_or("", |p| p.url.as_str()),
            review.title.as_str(),
            review.rating.to_string().as_str(),
            review.date.as_str(),
            review.reviewer_name.as_str(),
            review.text.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_products(outcome: &CrawlOutcome, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["rank", "title", "url", "price", "rating"])?;

    for product in &outcome.products {
        writer.write_record([
            product.rank.to_string().as_str(),
            product.title.as_str(),
            product.url.as_str(),
            product.price.as_deref().unwrap_or(""),
            product.rating.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
