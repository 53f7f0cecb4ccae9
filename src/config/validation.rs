use crate::config::types::{
    Config, CrawlerConfig, EmbedderConfig, EmbedderProvider, IndexConfig, ScopeConfig,
    UserAgentConfig,
};
use crate::url::ScopeFilter;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scope_config(&config.scope)?;
    validate_crawler_config(&config.crawler, &config.scope)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_embedder_config(&config.embedder)?;
    validate_index_config(&config.index)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig, scope: &ScopeConfig) -> Result<(), ConfigError> {
    if config.page_budget < 1 {
        return Err(ConfigError::Validation(format!(
            "page_budget must be >= 1, got {}",
            config.page_budget
        )));
    }

    if config.max_chunks_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "max_chunks_per_page must be >= 1, got {}",
            config.max_chunks_per_page
        )));
    }

    if config.fetch_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout must be >= 100ms, got {}ms",
            config.fetch_timeout
        )));
    }

    let start = validate_http_url("start_url", &config.start_url)?;

    // A seed outside the scope would make every harvested link unreachable
    let filter = ScopeFilter::from_config(scope);
    if !filter.is_in_scope(&start) {
        return Err(ConfigError::Validation(format!(
            "start_url '{}' is not within the configured scope",
            config.start_url
        )));
    }

    Ok(())
}

/// Validates scope configuration
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if config.allowed_hosts.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_hosts must list at least one host pattern".to_string(),
        ));
    }

    for pattern in &config.allowed_hosts {
        validate_host_pattern(pattern)?;
    }

    if config.excluded_path_markers.iter().any(|m| m.is_empty()) {
        return Err(ConfigError::Validation(
            "excluded_path_markers cannot contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates embedder configuration
fn validate_embedder_config(config: &EmbedderConfig) -> Result<(), ConfigError> {
    if config.dimensions < 1 {
        return Err(ConfigError::Validation(
            "embedder dimensions must be >= 1".to_string(),
        ));
    }

    if config.provider == EmbedderProvider::Http {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ConfigError::Validation("the http embedder requires an endpoint".to_string())
        })?;
        validate_http_url("embedder endpoint", endpoint)?;

        if config.model.as_deref().map_or(true, |m| m.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "the http embedder requires a model name".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates indexing service configuration
fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    validate_http_url("index endpoint", &config.endpoint)?;

    if config.preview_length < 1 {
        return Err(ConfigError::Validation(
            "preview_length must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Parses a URL and requires an HTTP(S) scheme
fn validate_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(url)
}

/// Validates a host pattern (supports wildcards)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(host) => validate_host_string(host),
        None => validate_host_string(pattern),
    }
}

/// Validates a host string (without wildcard prefix)
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host cannot be empty".to_string(),
        ));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    // Bare labels are rejected except for local test servers
    if !host.contains('.') && host != "localhost" {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' must contain at least one dot (e.g., 'example.org')",
            host
        )));
    }

    Ok(())
}
