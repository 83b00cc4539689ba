use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a configuration after parsing
///
/// Checks the ranges the rest of the crate relies on:
/// - retry budgets are at least 1
/// - the delay curve is ordered (base never above the cap)
/// - timeouts are non-zero
/// - the site base URL parses and is http(s)
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.max_attempts == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-attempts must be at least 1".to_string(),
        ));
    }

    if config.crawler.render_attempts == 0 {
        return Err(ConfigError::Validation(
            "crawler.render-attempts must be at least 1".to_string(),
        ));
    }

    if config.crawler.base_delay_ms > config.crawler.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "crawler.base-delay-ms ({}) exceeds crawler.max-delay-ms ({})",
            config.crawler.base_delay_ms, config.crawler.max_delay_ms
        )));
    }

    if config.session.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "session.request-timeout-ms must be non-zero".to_string(),
        ));
    }

    if config.session.login_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "session.login-timeout-ms must be non-zero".to_string(),
        ));
    }

    let base = Url::parse(&config.site.base_url)
        .map_err(|e| ConfigError::Validation(format!("site.base-url is invalid: {}", e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "site.base-url must be http(s), got scheme {}",
            base.scheme()
        )));
    }

    if config.output.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.directory must not be empty".to_string(),
        ));
    }

    Ok(())
}
