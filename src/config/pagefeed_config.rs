//! pagefeed configuration file handling
//!
//! Loads ~/.config/pagefeed/config.yaml and overlays the FACEBOOK_* and
//! REVALIDATION_SECRET environment variables on top of it.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Versioned Graph API base used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "https://graph.facebook.com/v19.0";

/// Facebook page and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebookConfig {
    /// Numeric id of the page whose posts are served
    #[serde(default)]
    pub page_id: String,

    /// Page access token
    #[serde(default)]
    pub access_token: String,

    /// Graph API base URL, including the version segment
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            page_id: String::new(),
            access_token: String::new(),
            api_base_url: default_api_base_url(),
        }
    }
}

/// Time-to-live per cached operation, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_page_info_ttl")]
    pub page_info_ttl_secs: u64,

    #[serde(default = "default_posts_ttl")]
    pub posts_ttl_secs: u64,

    #[serde(default = "default_engagement_ttl")]
    pub engagement_ttl_secs: u64,
}

fn default_page_info_ttl() -> u64 {
    3600
}

fn default_posts_ttl() -> u64 {
    300
}

fn default_engagement_ttl() -> u64 {
    600
}

impl CacheSettings {
    pub fn page_info_ttl(&self) -> Duration {
        Duration::from_secs(self.page_info_ttl_secs)
    }

    pub fn posts_ttl(&self) -> Duration {
        Duration::from_secs(self.posts_ttl_secs)
    }

    pub fn engagement_ttl(&self) -> Duration {
        Duration::from_secs(self.engagement_ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            page_info_ttl_secs: default_page_info_ttl(),
            posts_ttl_secs: default_posts_ttl(),
            engagement_ttl_secs: default_engagement_ttl(),
        }
    }
}

/// Feed presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Number of posts fetched for the initial page
    #[serde(default = "default_initial_page_size")]
    pub initial_page_size: u32,
}

fn default_initial_page_size() -> u32 {
    10
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            initial_page_size: default_initial_page_size(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Serve GET /api/facebook/cache-info (development only)
    #[serde(default)]
    pub expose_cache_info: bool,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            expose_cache_info: false,
        }
    }
}

/// Cache revalidation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevalidationSettings {
    /// Shared secret required by POST /api/facebook/revalidate
    #[serde(default)]
    pub secret: Option<String>,
}

/// pagefeed configuration
///
/// Represents the complete ~/.config/pagefeed/config.yaml file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFeedConfig {
    #[serde(default)]
    pub facebook: FacebookConfig,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub feed: FeedSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub revalidation: RevalidationSettings,
}

impl PageFeedConfig {
    /// Create a configuration with every default and no credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path` when given, else from the default path if it exists,
    /// else start from defaults. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load(&default_path)?
                } else {
                    tracing::debug!("No config file found, using defaults");
                    Self::new()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::PageFeedError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading pagefeed configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            page_id = %config.facebook.page_id,
            has_token = !config.facebook.access_token.is_empty(),
            posts_ttl = config.cache.posts_ttl_secs,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving pagefeed configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/pagefeed/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("pagefeed");
        path.push("config.yaml");
        path
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    ///
    /// FACEBOOK_ACCESS_TOKEN wins over FACEBOOK_USER_TOKEN.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(page_id) = get("FACEBOOK_PAGE_ID") {
            self.facebook.page_id = page_id;
        }
        if let Some(token) = get("FACEBOOK_ACCESS_TOKEN").or_else(|| get("FACEBOOK_USER_TOKEN")) {
            self.facebook.access_token = token;
        }
        if let Some(base) = get("FACEBOOK_API_BASE_URL") {
            self.facebook.api_base_url = base;
        }
        if let Some(secret) = get("REVALIDATION_SECRET") {
            self.revalidation.secret = Some(secret);
        }
    }

    /// Whether both a page id and an access token are present
    pub fn has_credentials(&self) -> bool {
        !self.facebook.page_id.trim().is_empty() && !self.facebook.access_token.trim().is_empty()
    }
}
