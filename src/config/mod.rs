//! Configuration system
//!
//! Loads ~/.config/pagefeed/config.yaml with support for:
//! - Facebook page id, access token and API base URL
//! - Per-operation cache TTLs
//! - Server bind address and development-only routes
//! - The cache revalidation secret
//!
//! Environment variables (FACEBOOK_PAGE_ID, FACEBOOK_ACCESS_TOKEN,
//! FACEBOOK_USER_TOKEN, FACEBOOK_API_BASE_URL, REVALIDATION_SECRET) override
//! the file.

mod pagefeed_config;
pub mod validation;

pub use pagefeed_config::{
    CacheSettings, FacebookConfig, FeedSettings, PageFeedConfig, RevalidationSettings,
    ServerSettings, DEFAULT_API_BASE_URL,
};
pub use validation::{validate_config, validate_config_result, ValidationError};
