//! Error types for pagefeed
//!
//! One enum covers configuration, Graph API and local failures. Uses thiserror
//! for ergonomic error handling.

use thiserror::Error;

/// Result type alias for pagefeed operations
pub type Result<T> = std::result::Result<T, PageFeedError>;

/// Why the Graph API rejected the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Token was valid once but has expired (code 190, subcode 463)
    Expired,
    /// Token is malformed, revoked or otherwise unusable (code 190)
    Invalid,
}

/// Comprehensive error type for pagefeed operations
#[derive(Error, Debug)]
pub enum PageFeedError {
    /// Missing or unusable configuration (page id, access token, config file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Access token expired or invalid
    #[error("{}", auth_message(.0))]
    UpstreamAuth(AuthFailure),

    /// A user token was supplied where a page token is required
    #[error("Page Access Token Required: You need a Page access token, not a User access token. Please check the setup instructions.")]
    WrongTokenType,

    /// Any other error object reported by the Graph API
    #[error("Facebook API Error: {message} (Code: {code})")]
    UpstreamApi {
        code: i64,
        subcode: Option<i64>,
        message: String,
    },

    /// Non-success HTTP status without a Graph error object
    #[error("{}", status_message(.0))]
    UpstreamStatus(u16),

    /// Transport failure talking to the Graph API
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected schema
    #[error("Unexpected response from Facebook: {0}")]
    Schema(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

fn auth_message(failure: &AuthFailure) -> &'static str {
    match failure {
        AuthFailure::Expired => "Access Token Expired: Your Facebook access token has expired. Please generate a new token and update your configuration.",
        AuthFailure::Invalid => "Invalid Access Token: Please check your Facebook access token in your configuration.",
    }
}

fn status_message(status: &u16) -> String {
    match *status {
        400 => "Bad request - check your access token and page ID".to_string(),
        403 => "Access denied - check your permissions and access token".to_string(),
        other => format!("Facebook API returned HTTP {}", other),
    }
}

impl PageFeedError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PageFeedError::Configuration(_) => "configuration",
            PageFeedError::UpstreamAuth(AuthFailure::Expired) => "token_expired",
            PageFeedError::UpstreamAuth(AuthFailure::Invalid) => "token_invalid",
            PageFeedError::WrongTokenType => "wrong_token_type",
            PageFeedError::UpstreamApi { .. } => "upstream_api",
            PageFeedError::UpstreamStatus(_) => "upstream_status",
            PageFeedError::Network(_) => "network",
            PageFeedError::Schema(_) => "schema",
            PageFeedError::Io(_) => "io",
            PageFeedError::Json(_) => "json",
            PageFeedError::Yaml(_) => "yaml",
            PageFeedError::Http(_) => "http",
            PageFeedError::Other(_) => "other",
        }
    }

    /// True when the remedy is a new or different access token
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            PageFeedError::UpstreamAuth(_) | PageFeedError::WrongTokenType
        )
    }
}
