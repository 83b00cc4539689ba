use serde::Deserialize;

/// Main configuration structure for kuchikomi
///
/// Every section has defaults, so a config file is optional and may be
/// partial. Job parameters (keyword, filter, page limit) come from the CLI,
/// not from here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Pacing and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Base delay between page requests (milliseconds); attempt 0 of the
    /// backoff curve
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single backoff delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Uniform random jitter added on top of each delay (milliseconds)
    #[serde(rename = "jitter-ms", default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Maximum load attempts for one page before the product fails
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fetch budget while waiting for the search result list to render
    #[serde(rename = "render-attempts", default = "default_render_attempts")]
    pub render_attempts: u32,
}

/// Session driver behavior
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Connection timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Bound on the whole login exchange (milliseconds)
    #[serde(rename = "login-timeout-ms", default = "default_login_timeout_ms")]
    pub login_timeout_ms: u64,

    /// User-Agent header presented by the session
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Target catalog endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Catalog origin; review and search paths are resolved against it
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

/// Export settings
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory for exported files, created on demand
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Which export formats to write
    #[serde(default)]
    pub format: OutputFormat,
}

/// Export format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    #[default]
    Both,
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_jitter_ms() -> u64 {
    1_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_render_attempts() -> u32 {
    3
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_login_timeout_ms() -> u64 {
    45_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_base_url() -> String {
    "https://www.amazon.com".to_string()
}

fn default_output_directory() -> String {
    "output".to_string()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_attempts: default_max_attempts(),
            render_attempts: default_render_attempts(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            login_timeout_ms: default_login_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            format: OutputFormat::default(),
        }
    }
}
