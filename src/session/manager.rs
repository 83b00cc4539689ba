//! Session lifecycle: open, optional login, scoped release
//!
//! A session is an explicit passed value owning exactly one page driver.
//! All navigation within a job goes through one session sequentially;
//! nothing here is process-global, so concurrent pipelines can each own an
//! independent session and tests can substitute a fake driver.

use crate::config::Config;
use crate::crawler::parser::{contains_any, parse_signin_form};
use crate::crawler::selectors;
use crate::pacing::{challenge_indicator, BackoffPolicy};
use crate::records::Credentials;
use crate::session::driver::{FetchedPage, HttpDriver, PageDriver, StoredCookie};
use crate::{CrawlError, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use url::Url;

/// Observable state of a session
///
/// Other components read only `authenticated`; the cookie jar stays inside
/// the driver.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub authenticated: bool,
    pub created_at: DateTime<Utc>,
}

/// One exclusively-owned browsing session against the catalog
pub struct Session {
    driver: Box<dyn PageDriver>,
    state: SessionState,
    backoff: BackoffPolicy,
    login_timeout: Duration,
    base_url: Url,
}

impl Session {
    /// Acquires a session with the cookie-jar HTTP driver
    pub fn open(config: &Config) -> Result<Self> {
        let driver = HttpDriver::new(&config.session)?;
        Self::with_driver(Box::new(driver), config)
    }

    /// Builds a session over an externally supplied driver (test seam)
    pub fn with_driver(driver: Box<dyn PageDriver>, config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.site.base_url).map_err(|e| CrawlError::SessionInit {
            message: format!("invalid base URL {}: {}", config.site.base_url, e),
        })?;

        Ok(Self {
            driver,
            state: SessionState {
                authenticated: false,
                created_at: Utc::now(),
            },
            backoff: BackoffPolicy::from_config(&config.crawler),
            login_timeout: Duration::from_millis(config.session.login_timeout_ms),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.authenticated
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.state.created_at
    }

    /// Navigates to a URL through the session's driver
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        self.driver.fetch(url).await
    }

    /// Authenticates against the catalog's signin form
    ///
    /// Drives the two-step exchange (email form, then password form; a
    /// combined form submits both at once), bounded by the configured login
    /// timeout. A challenge page at any step surfaces as `AuthChallenge`
    /// and is never retried here; a rejected exchange surfaces as
    /// `InvalidCredentials`.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let signin_url = self.base_url.join(selectors::SIGNIN_PATH)?;
        tracing::info!("Logging in via {}", signin_url);

        let exchange = self.login_exchange(&signin_url, credentials);
        match tokio::time::timeout(self.login_timeout, exchange).await {
            Ok(Ok(())) => {
                self.state.authenticated = true;
                tracing::info!("Login succeeded");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CrawlError::PageLoadTimeout {
                url: signin_url.to_string(),
            }),
        }
    }

    async fn login_exchange(&self, signin_url: &Url, credentials: &Credentials) -> Result<()> {
        let page = self.driver.fetch(signin_url.as_str()).await?;
        check_challenge(&page)?;

        let page_url = Url::parse(&page.final_url)?;
        let form = parse_signin_form(&page.body, &page_url).ok_or(CrawlError::ElementNotFound {
            url: page.final_url.clone(),
            what: "signin form",
        })?;

        // First submission: email, plus the password when the form is combined
        let mut fields = form.hidden.clone();
        if let Some(name) = &form.email_field {
            fields.push((name.clone(), credentials.email.clone()));
        }
        let mut password_sent = false;
        if let Some(name) = &form.password_field {
            fields.push((name.clone(), credentials.password.clone()));
            password_sent = true;
        }

        tokio::time::sleep(self.backoff.delay(0)).await;
        let mut page = self.driver.submit(form.action.as_str(), &fields).await?;
        check_challenge(&page)?;

        if !password_sent {
            let page_url = Url::parse(&page.final_url)?;
            let form = parse_signin_form(&page.body, &page_url).ok_or(
                CrawlError::ElementNotFound {
                    url: page.final_url.clone(),
                    what: "password form",
                },
            )?;
            let password_field =
                form.password_field
                    .as_ref()
                    .ok_or(CrawlError::ElementNotFound {
                        url: page.final_url.clone(),
                        what: "password field",
                    })?;

            let mut fields = form.hidden.clone();
            fields.push((password_field.clone(), credentials.password.clone()));

            tokio::time::sleep(self.backoff.delay(0)).await;
            page = self.driver.submit(form.action.as_str(), &fields).await?;
            check_challenge(&page)?;
        }

        if contains_any(&page.body, selectors::LOGIN_INDICATORS) {
            return Ok(());
        }

        if contains_any(&page.body, selectors::AUTH_ERROR_INDICATORS) {
            tracing::warn!("Signin form rejected the credentials");
        } else {
            tracing::warn!("No signed-in landing indicator after submit");
        }
        Err(CrawlError::InvalidCredentials)
    }

    /// Snapshot of the session's cookies for an external persistence
    /// collaborator; the core itself never writes them to disk
    pub fn export_cookies(&self) -> Vec<StoredCookie> {
        self.driver.cookies()
    }

    /// Replays a previously exported snapshot into the session
    pub fn import_cookies(&self, cookies: &[StoredCookie]) {
        self.driver.install_cookies(cookies);
    }

    /// Releases the session and everything it owns
    ///
    /// Dropping has the same effect; this makes the release explicit on
    /// deliberate exit paths.
    pub fn close(self) {
        tracing::debug!(
            "Closing session opened at {} (authenticated: {})",
            self.state.created_at,
            self.state.authenticated
        );
    }
}

/// Converts an on-page challenge into the login error taxonomy
fn check_challenge(page: &FetchedPage) -> Result<()> {
    let lowered = page.body.to_lowercase();
    if let Some(indicator) = challenge_indicator(&lowered) {
        return Err(CrawlError::AuthChallenge {
            indicator: indicator.to_string(),
        });
    }
    Ok(())
}
