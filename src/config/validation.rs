use crate::config::types::{
    Config, ControllerConfig, FetchMode, GatewayConfig, ListingFormat, OutputConfig, SiteConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_controller_config(&config.controller)?;
    validate_gateway_config(&config.gateway)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates controller configuration
fn validate_controller_config(config: &ControllerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 256 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 256, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.max_fetches == Some(0) {
        return Err(ConfigError::Validation(
            "max_fetches must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates gateway configuration
fn validate_gateway_config(config: &GatewayConfig) -> Result<(), ConfigError> {
    match (&config.mode, &config.endpoint) {
        (FetchMode::Gateway, None) => {
            return Err(ConfigError::Validation(
                "gateway mode requires an endpoint".to_string(),
            ));
        }
        (_, Some(endpoint)) => {
            let url = Url::parse(endpoint)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid gateway endpoint: {}", e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidUrl(format!(
                    "Gateway endpoint must be HTTP(S), got '{}'",
                    endpoint
                )));
            }
        }
        (FetchMode::Direct, None) => {}
    }

    if config.timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "gateway timeout must be >= 1000ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if config.database_path.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates every site entry and checks names are unique
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for site in sites {
        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate site name '{}'",
                site.name
            )));
        }
        validate_site(site)?;
    }
    Ok(())
}

fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    if site.name.is_empty() {
        return Err(ConfigError::Validation(
            "site name cannot be empty".to_string(),
        ));
    }

    if site.domains.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must declare at least one domain pattern",
            site.name
        )));
    }
    for pattern in &site.domains {
        validate_domain_pattern(pattern)?;
    }

    if site.seeds.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must have at least one seed URL",
            site.name
        )));
    }
    for seed in &site.seeds {
        let url = Url::parse(seed).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP(S)",
                seed
            )));
        }
    }

    let routes = &site.routes;
    if routes.root.is_empty() && routes.listing.is_empty() && routes.detail.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must declare at least one route",
            site.name
        )));
    }
    for pattern in routes
        .root
        .iter()
        .chain(&routes.listing)
        .chain(&routes.detail)
    {
        validate_regex(pattern)?;
    }

    validate_selector(&site.navigation.menu)?;
    match site.listing.format {
        ListingFormat::Html => {
            validate_selector(&site.listing.item_link)?;
            for selector in site
                .listing
                .next_page
                .iter()
                .chain(&site.listing.total_count)
            {
                validate_selector(selector)?;
            }
        }
        ListingFormat::Json => {
            for pointer in std::iter::once(&site.listing.items_pointer)
                .chain(&site.listing.total_pointer)
                .chain(&site.listing.next_pointer)
            {
                validate_pointer(pointer)?;
            }
        }
    }

    let embedded = validate_regex(&site.detail.embedded_json)?;
    if embedded.captures_len() < 2 {
        return Err(ConfigError::InvalidRoute {
            pattern: site.detail.embedded_json.clone(),
            message: "embedded-json needs a capture group".to_string(),
        });
    }
    if let Some(pointer) = &site.detail.product_pointer {
        validate_pointer(pointer)?;
    }

    Ok(())
}

fn validate_regex(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidRoute {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })
}

fn validate_pointer(pointer: &str) -> Result<(), ConfigError> {
    if !pointer.is_empty() && !pointer.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "JSON pointer '{}' must be empty or start with '/'",
            pointer
        )));
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
