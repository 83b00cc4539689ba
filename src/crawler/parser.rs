//! HTML extraction for the target catalog's page layouts
//!
//! All parsing is synchronous and returns owned data, so no DOM handle is
//! ever held across an await point. Extraction targets are looked up
//! through the fallback selector tables in [`super::selectors`]; the first
//! selector that yields a usable element wins.

use crate::crawler::selectors;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One product tile extracted from a search result page
#[derive(Debug, Clone)]
pub struct ProductTile {
    pub title: String,
    pub url: Url,
    pub price: Option<String>,
    pub rating: Option<String>,
}

/// One fully-parsed review entry
#[derive(Debug, Clone)]
pub struct ExtractedReview {
    pub title: String,
    pub text: String,
    pub rating: u8,
    pub date: String,
    pub reviewer_name: String,
}

/// Result of parsing one review listing page
#[derive(Debug, Clone)]
pub struct ReviewPage {
    /// Complete entries, in on-page display order
    pub reviews: Vec<ExtractedReview>,

    /// Entries dropped for a missing required field (text or rating)
    pub skipped: usize,

    /// Whether the pagination control offers a further page
    pub has_next: bool,
}

/// The signin form of the login flow
///
/// The site splits login over two form submissions (email, then password);
/// both stages parse into this shape, and a combined single-stage form
/// simply has both field names present.
#[derive(Debug, Clone)]
pub struct SigninForm {
    pub action: Url,
    pub hidden: Vec<(String, String)>,
    pub email_field: Option<String>,
    pub password_field: Option<String>,
}

/// Finds the first element matched by any selector in the list
fn first_match<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(element) = scope.select(&selector).next() {
                return Some(element);
            }
        }
    }
    None
}

/// Returns the matches of the first selector in the list that matches at all
fn all_matches<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            let found: Vec<_> = scope.select(&selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
    }
    Vec::new()
}

/// Extracts trimmed non-empty text through the fallback selector list
fn text_by_selectors(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            for element in scope.select(&selector) {
                let text = element.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Parses a search result page into product tiles, in display order
///
/// Tiles without a resolvable product URL or a title are dropped; the
/// resolver dedups and ranks what remains.
pub fn parse_search_results(html: &str, base: &Url) -> Vec<ProductTile> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut tiles = Vec::new();
    for tile in all_matches(root, selectors::PRODUCT_TILE) {
        let Some(url) = extract_tile_url(tile, base) else {
            continue;
        };
        let Some(title) = text_by_selectors(tile, selectors::PRODUCT_TITLE) else {
            continue;
        };

        tiles.push(ProductTile {
            title,
            url,
            price: text_by_selectors(tile, selectors::PRODUCT_PRICE),
            rating: extract_tile_rating(tile),
        });
    }
    tiles
}

/// Resolves a tile's product URL, decoding sponsored redirect links
fn extract_tile_url(tile: ElementRef<'_>, base: &Url) -> Option<Url> {
    // Direct product links first
    for raw in selectors::PRODUCT_LINK {
        if let Ok(selector) = Selector::parse(raw) {
            for element in tile.select(&selector) {
                if let Some(url) = resolve_product_href(element.value().attr("href"), base) {
                    return Some(url);
                }
            }
        }
    }

    // Sponsored tiles wrap the product URL in a click-tracking redirect
    let anchor = Selector::parse("a[href]").ok()?;
    for element in tile.select(&anchor) {
        let href = element.value().attr("href")?;
        if href.contains("sspa/click") {
            if let Some(url) = decode_sponsored_href(href, base) {
                return Some(url);
            }
        } else if let Some(url) = resolve_product_href(Some(href), base) {
            return Some(url);
        }
    }
    None
}

fn resolve_product_href(href: Option<&str>, base: &Url) -> Option<Url> {
    let href = href?;
    if !href.contains("/dp/") && !href.contains("/gp/product/") {
        return None;
    }
    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Unwraps the `url=` parameter of a sponsored click-tracking link
fn decode_sponsored_href(href: &str, base: &Url) -> Option<Url> {
    let wrapped = base.join(href).ok()?;
    let target = wrapped
        .query_pairs()
        .find(|(name, _)| name == "url")
        .map(|(_, value)| value.into_owned())?;
    resolve_product_href(Some(target.as_str()), base)
}

fn extract_tile_rating(tile: ElementRef<'_>) -> Option<String> {
    if let Some(text) = text_by_selectors(tile, selectors::PRODUCT_RATING) {
        return Some(text);
    }
    // Icon-only variants carry the rating in the aria-label
    first_match(tile, selectors::PRODUCT_RATING)
        .and_then(|element| element.value().attr("aria-label"))
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
}

/// Parses one review listing page
pub fn parse_review_page(html: &str) -> ReviewPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut reviews = Vec::new();
    let mut skipped = 0;
    for entry in all_matches(root, selectors::REVIEW_ENTRY) {
        let text = text_by_selectors(entry, selectors::REVIEW_TEXT);
        let rating = text_by_selectors(entry, selectors::REVIEW_RATING)
            .as_deref()
            .and_then(parse_rating_text);

        // Text and rating are required; everything else degrades to empty
        let (Some(text), Some(rating)) = (text, rating) else {
            skipped += 1;
            continue;
        };

        reviews.push(ExtractedReview {
            title: text_by_selectors(entry, selectors::REVIEW_TITLE).unwrap_or_default(),
            text,
            rating,
            date: text_by_selectors(entry, selectors::REVIEW_DATE).unwrap_or_default(),
            reviewer_name: text_by_selectors(entry, selectors::REVIEWER_NAME).unwrap_or_default(),
        });
    }

    ReviewPage {
        reviews,
        skipped,
        has_next: has_next_page(root),
    }
}

/// A further page exists while the "next" pagination item still carries an
/// anchor; the disabled variant is a bare list item.
fn has_next_page(root: ElementRef<'_>) -> bool {
    let Some(item) = first_match(root, selectors::NEXT_PAGE_ITEM) else {
        return false;
    };
    if item.value().classes().any(|class| class == "a-disabled") {
        return false;
    }
    match Selector::parse("a[href]") {
        Ok(anchor) => item.select(&anchor).next().is_some(),
        Err(_) => false,
    }
}

/// Parses a displayed rating like "4.0 out of 5 stars" into 1..=5
pub fn parse_rating_text(text: &str) -> Option<u8> {
    let first = text.split_whitespace().next()?;
    let value: f64 = first.parse().ok()?;
    let rounded = value.round();
    if (1.0..=5.0).contains(&rounded) && (value - rounded).abs() < 0.25 {
        Some(rounded as u8)
    } else {
        None
    }
}

/// Parses the signin form out of a login page
///
/// Finds the first form carrying an email or password input, collects its
/// hidden fields, and resolves the submit action against the page URL.
pub fn parse_signin_form(html: &str, page_url: &Url) -> Option<SigninForm> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").ok()?;
    let input_selector = Selector::parse("input").ok()?;

    for form in document.select(&form_selector) {
        let mut hidden = Vec::new();
        let mut email_field = None;
        let mut password_field = None;

        for input in form.select(&input_selector) {
            let value = input.value();
            let name = value.attr("name").unwrap_or("");
            let input_type = value.attr("type").unwrap_or("text");
            let id = value.attr("id").unwrap_or("");

            if input_type == "hidden" && !name.is_empty() {
                hidden.push((name.to_string(), value.attr("value").unwrap_or("").to_string()));
            } else if input_type == "email" || name == "email" || id == "ap_email" {
                email_field = Some(name.to_string()).filter(|n| !n.is_empty());
            } else if input_type == "password" || name == "password" || id == "ap_password" {
                password_field = Some(name.to_string()).filter(|n| !n.is_empty());
            }
        }

        if email_field.is_none() && password_field.is_none() {
            continue;
        }

        let action = match form.value().attr("action") {
            Some(action) if !action.trim().is_empty() => page_url.join(action).ok()?,
            _ => page_url.clone(),
        };

        return Some(SigninForm {
            action,
            hidden,
            email_field,
            password_field,
        });
    }
    None
}

/// Case-insensitive scan for any marker in the list
pub fn contains_any(body: &str, markers: &[&str]) -> bool {
    let lowered = body.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}
