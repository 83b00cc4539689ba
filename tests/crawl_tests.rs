//! Integration tests for the crawl engine
//!
//! These tests serve a fake catalog with wiremock and run full jobs
//! end-to-end: search resolution, pagination, filtering, retry bounds,
//! login, and blocking.

use kuchikomi::config::Config;
use kuchikomi::records::{CrawlJob, Credentials, StarRating};
use kuchikomi::{CrawlError, Orchestrator};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointing at the mock catalog, with near-zero pacing
fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.crawler.base_delay_ms = 5;
    config.crawler.max_delay_ms = 20;
    config.crawler.jitter_ms = 0;
    config.crawler.max_attempts = 3;
    config.crawler.render_attempts = 2;
    config.session.login_timeout_ms = 5_000;
    config
}

fn test_job(keyword: &str) -> CrawlJob {
    CrawlJob {
        keyword: keyword.to_string(),
        star_filter: None,
        max_pages: 2,
        top_count: 3,
        use_login: false,
        deadline: None,
    }
}

fn search_page(tiles: &[(&str, &str)]) -> String {
    let tiles: String = tiles
        .iter()
        .map(|(asin, title)| {
            format!(
                r#"<div data-component-type="s-search-result">
                    <h2><a href="/dp/{asin}"><span>{title}</span></a></h2>
                    <span class="a-price"><span class="a-offscreen">$19.99</span></span>
                </div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", tiles)
}

fn review_page(reviews: &[(u8, &str)], has_next: bool) -> String {
    let entries: String = reviews
        .iter()
        .map(|(rating, text)| {
            format!(
                r#"<div data-hook="review">
                    <a data-hook="review-title"><span>Title: {text}</span></a>
                    <i data-hook="review-star-rating"><span class="a-icon-alt">{rating}.0 out of 5 stars</span></i>
                    <span data-hook="review-date">June 1, 2024</span>
                    <span data-hook="review-author" class="a-profile-name">Sam</span>
                    <span data-hook="review-body"><span>{text}</span></span>
                </div>"#
            )
        })
        .collect();
    let pagination = if has_next {
        r#"<ul class="a-pagination"><li class="a-last"><a href="?pageNumber=next">Next</a></li></ul>"#
    } else {
        r#"<ul class="a-pagination"><li class="a-last a-disabled">Next</li></ul>"#
    };
    format!("<html><body>{}{}</body></html>", entries, pagination)
}

fn captcha_page() -> String {
    r#"<html><body><form action="/errors/validateCaptcha">
        <p>Enter the characters you see below</p></form></body></html>"#
        .to_string()
}

async fn mount_search(server: &MockServer, keyword: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", keyword))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_review_page(server: &MockServer, asin: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/product-reviews/{}/", asin)))
        .and(query_param("pageNumber", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_three_products_two_pages() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        "wireless headphones",
        search_page(&[("B001", "First"), ("B002", "Second"), ("B003", "Third")]),
    )
    .await;

    for asin in ["B001", "B002", "B003"] {
        mount_review_page(
            &server,
            asin,
            1,
            review_page(&[(5, &format!("{asin} p1 r1")), (4, &format!("{asin} p1 r2"))], true),
        )
        .await;
        mount_review_page(
            &server,
            asin,
            2,
            review_page(&[(3, &format!("{asin} p2 r1"))], false),
        )
        .await;
    }

    let orchestrator = Orchestrator::new(test_config(&server.uri()));
    let outcome = orchestrator
        .run(&test_job("wireless headphones"), None, None)
        .await
        .unwrap();

    // Shortlist: length 3, ranks contiguous from 1, display order preserved
    assert_eq!(outcome.products.len(), 3);
    let ranks: Vec<u8> = outcome.products.iter().map(|p| p.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(outcome.products[0].title, "First");

    // Reviews grouped by product rank, pages in increasing order, display
    // order preserved within pages
    let texts: Vec<&str> = outcome.reviews.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "B001 p1 r1",
            "B001 p1 r2",
            "B001 p2 r1",
            "B002 p1 r1",
            "B002 p1 r2",
            "B002 p2 r1",
            "B003 p1 r1",
            "B003 p1 r2",
            "B003 p2 r1",
        ]
    );
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn test_second_page_skipped_without_next_control() {
    let server = MockServer::start().await;
    mount_search(&server, "lamp", search_page(&[("B010", "Only")])).await;
    mount_review_page(
        &server,
        "B010",
        1,
        review_page(&[(5, "only page")], false),
    )
    .await;

    // Page 2 must never be requested
    Mock::given(method("GET"))
        .and(path("/product-reviews/B010/"))
        .and(query_param("pageNumber", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(review_page(&[], false)))
        .expect(0)
        .mount(&server)
        .await;

    let mut job = test_job("lamp");
    job.top_count = 1;
    let outcome = Orchestrator::new(test_config(&server.uri()))
        .run(&job, None, None)
        .await
        .unwrap();

    assert_eq!(outcome.reviews.len(), 1);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn test_star_filter_keeps_matching_reviews_in_order() {
    let server = MockServer::start().await;
    mount_search(&server, "x", search_page(&[("B020", "Filtered")])).await;
    mount_review_page(
        &server,
        "B020",
        1,
        review_page(&[(5, "first five"), (4, "a four"), (5, "second five"), (3, "a three")], false),
    )
    .await;

    let mut job = test_job("x");
    job.top_count = 1;
    job.max_pages = 1;
    job.star_filter = StarRating::new(5);

    let outcome = Orchestrator::new(test_config(&server.uri()))
        .run(&job, None, None)
        .await
        .unwrap();

    let texts: Vec<&str> = outcome.reviews.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["first five", "second five"]);
    assert!(outcome.reviews.iter().all(|r| r.rating == 5));
}

#[tokio::test]
async fn test_max_pages_bounds_pagination() {
    let server = MockServer::start().await;
    mount_search(&server, "endless", search_page(&[("B030", "Deep")])).await;
    // Every page claims a further one exists
    mount_review_page(&server, "B030", 1, review_page(&[(5, "page one")], true)).await;
    mount_review_page(&server, "B030", 2, review_page(&[(5, "page two")], true)).await;

    Mock::given(method("GET"))
        .and(path("/product-reviews/B030/"))
        .and(query_param("pageNumber", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(review_page(&[(5, "page three")], true)))
        .expect(0)
        .mount(&server)
        .await;

    let mut job = test_job("endless");
    job.top_count = 1;
    job.max_pages = 2;

    let outcome = Orchestrator::new(test_config(&server.uri()))
        .run(&job, None, None)
        .await
        .unwrap();

    let texts: Vec<&str> = outcome.reviews.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["page one", "page two"]);
}

#[tokio::test]
async fn test_rate_limited_page_retried_exactly_max_attempts() {
    let server = MockServer::start().await;
    mount_search(&server, "throttled", search_page(&[("B040", "Hot item")])).await;

    // The review page always refuses; exactly max-attempts fetches, then the
    // product fails with the rate limit as the recorded cause
    Mock::given(method("GET"))
        .and(path("/product-reviews/B040/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let mut job = test_job("throttled");
    job.top_count = 1;

    let outcome = Orchestrator::new(test_config(&server.uri()))
        .run(&job, None, None)
        .await
        .unwrap();

    assert!(outcome.reviews.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].product_rank, 1);
    assert_eq!(outcome.errors[0].kind, "rate_limited");

}

#[tokio::test]
async fn test_failed_product_does_not_stop_siblings() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        "mixed",
        search_page(&[("B050", "Broken"), ("B051", "Working")]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/product-reviews/B050/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    mount_review_page(&server, "B051", 1, review_page(&[(4, "still here")], false)).await;

    let outcome = Orchestrator::new(test_config(&server.uri()))
        .run(&test_job("mixed"), None, None)
        .await
        .unwrap();

    // Partial result set plus an explicit error list
    assert_eq!(outcome.reviews.len(), 1);
    assert_eq!(outcome.reviews[0].product_rank, 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].product_rank, 1);
    assert_eq!(outcome.errors[0].kind, "rate_limited");
}

#[tokio::test]
async fn test_no_results_aborts_the_job() {
    let server = MockServer::start().await;
    // The result list never renders; the fetch budget is spent, then the
    // job fails without retrying at job level
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .expect(2)
        .mount(&server)
        .await;

    let result = Orchestrator::new(test_config(&server.uri()))
        .run(&test_job("nothing here"), None, None)
        .await;

    match result {
        Err(e @ CrawlError::NoResults { .. }) => assert!(e.is_job_fatal()),
        other => panic!("expected NoResults, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_blocked_search_aborts_the_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(captcha_page()))
        .expect(1)
        .mount(&server)
        .await;

    let result = Orchestrator::new(test_config(&server.uri()))
        .run(&test_job("anything"), None, None)
        .await;

    assert!(matches!(result, Err(CrawlError::Blocked { .. })));
}

#[tokio::test]
async fn test_blocked_review_page_aborts_the_job() {
    let server = MockServer::start().await;
    mount_search(&server, "walled", search_page(&[("B060", "Guarded")])).await;
    Mock::given(method("GET"))
        .and(path("/product-reviews/B060/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(captcha_page()))
        .expect(1)
        .mount(&server)
        .await;

    let mut job = test_job("walled");
    job.top_count = 1;

    let result = Orchestrator::new(test_config(&server.uri()))
        .run(&job, None, None)
        .await;

    // Blocked is job-fatal, never a per-product error
    assert!(matches!(result, Err(CrawlError::Blocked { .. })));
}

fn signin_email_form() -> String {
    r#"<html><body>
        <form name="signIn" action="/ap/signin/email" method="post">
            <input type="hidden" name="appActionToken" value="tok123" />
            <input type="email" id="ap_email" name="email" />
        </form>
    </body></html>"#
        .to_string()
}

fn signin_password_form() -> String {
    r#"<html><body>
        <form name="signIn" action="/ap/signin/password" method="post">
            <input type="hidden" name="workflow" value="step2" />
            <input type="password" id="ap_password" name="password" />
        </form>
    </body></html>"#
        .to_string()
}

fn signed_in_landing() -> String {
    r#"<html><body><span>Hello, Sam</span><a href="/logout">Sign Out</a></body></html>"#.to_string()
}

fn auth_error_page() -> String {
    r#"<html><body><div class="a-alert-content">There was a problem.
        Your password is incorrect</div></body></html>"#
        .to_string()
}

async fn mount_signin_flow(server: &MockServer, final_page: String) {
    Mock::given(method("GET"))
        .and(path("/ap/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(signin_email_form()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ap/signin/email"))
        .and(body_string_contains("appActionToken=tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(signin_password_form()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ap/signin/password"))
        .and(body_string_contains("workflow=step2"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(final_page))
        .mount(server)
        .await;
}

fn credentials() -> Credentials {
    Credentials {
        email: "sam@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn test_wrong_credentials_abort_before_search() {
    let server = MockServer::start().await;
    mount_signin_flow(&server, auth_error_page()).await;

    // The search endpoint must never be touched
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&[("B070", "Never")])))
        .expect(0)
        .mount(&server)
        .await;

    let mut job = test_job("anything");
    job.use_login = true;

    let result = Orchestrator::new(test_config(&server.uri()))
        .run(&job, Some(&credentials()), None)
        .await;

    assert!(matches!(result, Err(CrawlError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_success_then_crawl() {
    let server = MockServer::start().await;
    mount_signin_flow(&server, signed_in_landing()).await;
    mount_search(&server, "member deals", search_page(&[("B080", "Members only")])).await;
    mount_review_page(&server, "B080", 1, review_page(&[(5, "worth it")], false)).await;

    let mut job = test_job("member deals");
    job.top_count = 1;
    job.use_login = true;

    let outcome = Orchestrator::new(test_config(&server.uri()))
        .run(&job, Some(&credentials()), None)
        .await
        .unwrap();

    assert_eq!(outcome.reviews.len(), 1);
    assert_eq!(outcome.reviews[0].text, "worth it");
}

#[tokio::test]
async fn test_challenge_during_login_surfaces_as_auth_challenge() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ap/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(captcha_page()))
        .mount(&server)
        .await;

    let mut job = test_job("anything");
    job.use_login = true;

    let result = Orchestrator::new(test_config(&server.uri()))
        .run(&job, Some(&credentials()), None)
        .await;

    assert!(matches!(result, Err(CrawlError::AuthChallenge { .. })));
}

#[tokio::test]
async fn test_search_is_idempotent_against_unchanged_catalog() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        "stable",
        search_page(&[("B090", "Alpha"), ("B091", "Beta")]),
    )
    .await;
    for asin in ["B090", "B091"] {
        mount_review_page(&server, asin, 1, review_page(&[], false)).await;
    }

    let mut job = test_job("stable");
    job.max_pages = 1;
    let orchestrator = Orchestrator::new(test_config(&server.uri()));

    let first = orchestrator.run(&job, None, None).await.unwrap();
    let second = orchestrator.run(&job, None, None).await.unwrap();

    let ranks = |outcome: &kuchikomi::records::CrawlOutcome| {
        outcome
            .products
            .iter()
            .map(|p| (p.rank, p.url.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(ranks(&first), ranks(&second));
}

#[tokio::test]
async fn test_expired_deadline_cancels_remaining_work() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        "slow",
        search_page(&[("B100", "One"), ("B101", "Two")]),
    )
    .await;

    let mut job = test_job("slow");
    job.deadline = Some(Duration::ZERO);

    let outcome = Orchestrator::new(test_config(&server.uri()))
        .run(&job, None, None)
        .await
        .unwrap();

    // Nothing silently dropped: every unprocessed product is reported
    assert!(outcome.reviews.is_empty());
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors.iter().all(|e| e.kind == "cancelled"));
}
