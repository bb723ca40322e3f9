use crate::config::types::{Config, CrawlerConfig, OutputConfig, SelectorConfig, TargetConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_crawler_config(&config.crawler)?;
    validate_selector_config(&config.selectors)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the harvested page and session scope
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target url '{}': {}", config.url, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "Target url '{}' must use http or https",
            config.url
        )));
    }

    // A leading dot scopes the cookie to subdomains as well
    validate_domain_string(config.cookie_domain.trim_start_matches('.'))?;

    if config.signin_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "signin_marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1000ms, got {}ms",
            config.timeout
        )));
    }

    if config.default_fetch_count < 1 || config.default_fetch_count > 500 {
        return Err(ConfigError::Validation(format!(
            "default_fetch_count must be between 1 and 500, got {}",
            config.default_fetch_count
        )));
    }

    if config.default_fetch_interval < 1000 {
        return Err(ConfigError::Validation(format!(
            "default_fetch_interval must be >= 1000ms, got {}ms",
            config.default_fetch_interval
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every selector parses as CSS
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    let selectors = [
        ("container", &config.container),
        ("link", &config.link),
        ("title", &config.title),
        ("excerpt", &config.excerpt),
        ("heat", &config.heat),
    ];

    for (name, selector) in selectors {
        if selector.trim().is_empty() {
            return Err(ConfigError::InvalidSelector(format!(
                "{} selector cannot be empty",
                name
            )));
        }

        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidSelector(format!("{} selector '{}': {:?}", name, selector, e))
        })?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain string (without leading dot)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "cookie_domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.ends_with('.') || domain.starts_with('-') || domain.ends_with('-') {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot start with '-' or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
