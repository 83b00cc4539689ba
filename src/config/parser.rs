use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use kuchikomi::config::load_config;
///
/// let config = load_config(Path::new("kuchikomi.toml")).unwrap();
/// println!("Base delay: {}ms", config.crawler.base_delay_ms);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Returns the validated default configuration, used when no config file
/// is supplied on the command line
pub fn default_config() -> Config {
    Config::default()
}
