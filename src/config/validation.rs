//! Configuration validation
//!
//! Checks a pagefeed configuration before anything talks to the Graph API:
//! - Page id and access token are present
//! - The API base URL parses
//! - TTLs and page sizes are usable

use super::pagefeed_config::PageFeedConfig;
use crate::PageFeedError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a pagefeed configuration
pub fn validate_config(config: &PageFeedConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.facebook.page_id.trim().is_empty() {
        errors.push(ValidationError::new(
            "facebook.page_id",
            "Missing page id. Set FACEBOOK_PAGE_ID or facebook.page_id.",
        ));
    }

    if config.facebook.access_token.trim().is_empty() {
        errors.push(ValidationError::new(
            "facebook.access_token",
            "Missing access token. Set FACEBOOK_ACCESS_TOKEN or facebook.access_token.",
        ));
    }

    if reqwest::Url::parse(&config.facebook.api_base_url).is_err() {
        errors.push(ValidationError::new(
            "facebook.api_base_url",
            format!("Invalid URL '{}'", config.facebook.api_base_url),
        ));
    }

    let ttls = [
        ("cache.page_info_ttl_secs", config.cache.page_info_ttl_secs),
        ("cache.posts_ttl_secs", config.cache.posts_ttl_secs),
        ("cache.engagement_ttl_secs", config.cache.engagement_ttl_secs),
    ];
    for (field, value) in ttls {
        if value == 0 {
            errors.push(ValidationError::new(field, "TTL must be greater than 0"));
        }
    }

    if !(1..=100).contains(&config.feed.initial_page_size) {
        errors.push(ValidationError::new(
            "feed.initial_page_size",
            "Page size must be between 1 and 100",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and fold all problems into one configuration error
pub fn validate_config_result(config: &PageFeedConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        PageFeedError::Configuration(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
