use crate::config::types::{
    Config, CourseEntry, CrawlerConfig, ModuleConfig, SearchConfig, StorageConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Smallest per-writer memory budget tantivy accepts
const MIN_WRITER_MEMORY_BYTES: usize = 15_000_000;

/// Shortest accepted anti-forgery secret
const MIN_XSRF_SECRET_LEN: usize = 16;

/// Secrets that appear in sample configurations
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "secret", "xsrf-secret"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_search_config(&config.search)?;
    validate_storage_config(&config.storage)?;
    validate_module_config(&config.module)?;
    validate_courses(&config.courses)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // Only seed pages and their first-degree links are crawled
    if config.link_depth > 1 {
        return Err(ConfigError::Validation(format!(
            "link_depth must be 0 or 1, got {}",
            config.link_depth
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be >= 1 second".to_string(),
        ));
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

    // The name doubles as the robots.txt product token
    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.results_limit < 1 || config.results_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "results_limit must be between 1 and 100, got {}",
            config.results_limit
        )));
    }

    if config.writer_memory_bytes < MIN_WRITER_MEMORY_BYTES {
        return Err(ConfigError::Validation(format!(
            "writer_memory_bytes must be >= {}, got {}",
            MIN_WRITER_MEMORY_BYTES, config.writer_memory_bytes
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_module_config(config: &ModuleConfig) -> Result<(), ConfigError> {
    let secret = config.xsrf_secret.trim();
    if secret.is_empty() {
        return Err(ConfigError::Validation(
            "module.xsrf-secret must be set".to_string(),
        ));
    }

    if PLACEHOLDER_SECRETS.contains(&secret.to_lowercase().as_str()) {
        return Err(ConfigError::Validation(format!(
            "module.xsrf-secret is a placeholder value ('{}')",
            secret
        )));
    }

    if secret.chars().count() < MIN_XSRF_SECRET_LEN {
        return Err(ConfigError::Validation(format!(
            "module.xsrf-secret must be at least {} characters",
            MIN_XSRF_SECRET_LEN
        )));
    }

    if config.xsrf_max_age_secs <= 0 {
        return Err(ConfigError::Validation(format!(
            "xsrf_max_age_secs must be positive, got {}",
            config.xsrf_max_age_secs
        )));
    }

    Ok(())
}

/// Validates course entries
fn validate_courses(courses: &[CourseEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for course in courses {
        if course.id.is_empty()
            || !course
                .id
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "Course id '{}' must be non-empty and contain only alphanumeric characters, hyphens and underscores",
                course.id
            )));
        }

        if !seen.insert(course.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate course id '{}'",
                course.id
            )));
        }

        if course.seeds.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Course '{}' must have at least one seed URL",
                course.id
            )));
        }

        for seed in &course.seeds {
            let url = Url::parse(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "Seed URL '{}' must use HTTP or HTTPS",
                    seed
                )));
            }
        }

        for pattern in &course.allowed_domains {
            validate_domain_pattern(pattern)?;
        }
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

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_string(domain)
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

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
