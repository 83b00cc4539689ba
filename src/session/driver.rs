//! Page driver: the capability surface the crawl engine navigates through
//!
//! The state machine never talks to an HTTP client directly; it goes
//! through [`PageDriver`], so tests can substitute a fake site and the
//! engine stays independent of the concrete driver.

use crate::config::SessionConfig;
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, SET_COOKIE};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// One fetched page, body fully read
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Page body
    pub body: String,
}

/// A cookie as captured from a response, replayable into a fresh jar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCookie {
    /// URL the cookie was set for
    pub url: String,

    /// Raw `Set-Cookie` header value
    pub raw: String,
}

/// Navigation capabilities of one browsing session
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates to a URL and returns the resulting page
    async fn fetch(&self, url: &str) -> Result<FetchedPage, CrawlError>;

    /// Submits a form (POST, form-urlencoded) and returns the landing page
    async fn submit(&self, url: &str, fields: &[(String, String)])
        -> Result<FetchedPage, CrawlError>;

    /// Snapshot of the cookies observed during this session
    fn cookies(&self) -> Vec<StoredCookie>;

    /// Replays previously captured cookies into the session
    fn install_cookies(&self, cookies: &[StoredCookie]);
}

/// Cookie-jar-backed HTTP driver for the target catalog
///
/// Presents browser-like headers; the jar carries the signin cookies for
/// the lifetime of the session. Responses' `Set-Cookie` headers are also
/// recorded verbatim so the session can be snapshotted for an external
/// persistence collaborator.
pub struct HttpDriver {
    client: reqwest::Client,
    jar: Arc<Jar>,
    recorded: Mutex<Vec<StoredCookie>>,
}

impl HttpDriver {
    pub fn new(config: &SessionConfig) -> Result<Self, CrawlError> {
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .cookie_provider(jar.clone())
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| CrawlError::SessionInit {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            jar,
            recorded: Mutex::new(Vec::new()),
        })
    }

    fn record_cookies(&self, url: &str, headers: &HeaderMap) {
        let mut recorded = self.recorded.lock().unwrap();
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                recorded.push(StoredCookie {
                    url: url.to_string(),
                    raw: raw.to_string(),
                });
            }
        }
    }

    async fn read_page(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<FetchedPage, CrawlError> {
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        self.record_cookies(&final_url, response.headers());

        let body = response.text().await.map_err(|e| map_reqwest_error(url, e))?;

        Ok(FetchedPage {
            final_url,
            status,
            body,
        })
    }
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        tracing::trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;
        self.read_page(url, response).await
    }

    async fn submit(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<FetchedPage, CrawlError> {
        tracing::trace!("POST {} ({} fields)", url, fields.len());
        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;
        self.read_page(url, response).await
    }

    fn cookies(&self) -> Vec<StoredCookie> {
        self.recorded.lock().unwrap().clone()
    }

    fn install_cookies(&self, cookies: &[StoredCookie]) {
        let mut installed = 0;
        for cookie in cookies {
            match Url::parse(&cookie.url) {
                Ok(url) => {
                    self.jar.add_cookie_str(&cookie.raw, &url);
                    installed += 1;
                }
                Err(e) => tracing::warn!("Skipping cookie with invalid URL {}: {}", cookie.url, e),
            }
        }
        if installed > 0 {
            tracing::debug!("Installed {} saved cookies", installed);
        }
    }
}

/// Maps a transport error to the crawl taxonomy
///
/// Timeouts are page-recoverable; everything else surfaces with the URL
/// attached for reporting.
fn map_reqwest_error(url: &str, error: reqwest::Error) -> CrawlError {
    if error.is_timeout() {
        CrawlError::PageLoadTimeout {
            url: url.to_string(),
        }
    } else {
        CrawlError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
