//! Selector tables for the target catalog's page layout
//!
//! Each extraction target carries an ordered list of CSS selectors; the
//! parser walks the list and keeps the first one that yields a usable
//! element. The site ships several layout variants at once (A/B tests,
//! sponsored tiles, legacy review markup), so a single selector per target
//! is never enough.

/// Path of the search endpoint, relative to the site base URL
pub const SEARCH_PATH: &str = "/s";

/// Path of the signin form, relative to the site base URL
pub const SIGNIN_PATH: &str = "/ap/signin";

/// Search result tiles, one per product
pub const PRODUCT_TILE: &[&str] = &[
    r#"[data-component-type="s-search-result"]"#,
    ".s-result-item",
    "[data-asin]",
];

/// Product title inside a tile
pub const PRODUCT_TITLE: &[&str] = &[
    "h2 a span",
    "h2 span",
    ".s-color-base",
    r#"a[href*="/dp/"] span"#,
];

/// Product link inside a tile
pub const PRODUCT_LINK: &[&str] = &[
    "h2 a",
    r#"a[href*="/dp/"]"#,
    r#"a[href*="/gp/product/"]"#,
];

/// Displayed price inside a tile
pub const PRODUCT_PRICE: &[&str] = &[".a-price .a-offscreen", ".a-price-whole"];

/// Aggregate rating text inside a tile
pub const PRODUCT_RATING: &[&str] = &[".a-icon-alt", r#"[data-hook="rating-out-of-text"]"#];

/// Review entries on a review listing page
pub const REVIEW_ENTRY: &[&str] = &[
    r#"[data-hook="review"]"#,
    ".a-section.review",
    ".cr-original-review-item",
];

/// Review body text inside an entry
pub const REVIEW_TEXT: &[&str] = &[
    r#"[data-hook="review-body"] span"#,
    r#"[data-hook="review-body"]"#,
];

/// Review star rating inside an entry ("4.0 out of 5 stars")
pub const REVIEW_RATING: &[&str] = &[r#"[data-hook="review-star-rating"]"#, ".a-icon-alt"];

/// Review date inside an entry
pub const REVIEW_DATE: &[&str] = &[r#"[data-hook="review-date"]"#];

/// Reviewer display name inside an entry
pub const REVIEWER_NAME: &[&str] = &[r#"[data-hook="review-author"]"#, ".a-profile-name"];

/// Review title inside an entry
pub const REVIEW_TITLE: &[&str] = &[
    r#"[data-hook="review-title"] span"#,
    r#"[data-hook="review-title"]"#,
    ".review-title",
];

/// The "next page" list item of the pagination control. It carries an
/// anchor only while more pages exist; the disabled variant is a bare item.
pub const NEXT_PAGE_ITEM: &[&str] = &[".a-pagination li.a-last", ".a-pagination .a-next"];

/// Text fragments that mark a signed-in landing page (matched lowercase)
pub const LOGIN_INDICATORS: &[&str] = &[
    "hello,",
    "your account",
    "sign out",
    "account & lists",
];

/// Text fragments that mark a rejected credential exchange (matched lowercase)
pub const AUTH_ERROR_INDICATORS: &[&str] = &[
    "there was a problem",
    "your password is incorrect",
    "we cannot find an account",
    "auth-error-message",
];
