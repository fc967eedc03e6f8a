//! reqwest implementation of the Graph API access layer

use super::types::{Engagement, PageInfo, PostsPage};
use super::wire::{self, EngagementWire, PageInfoWire, PostsWire};
use super::GraphApi;
use crate::config::DEFAULT_API_BASE_URL;
use crate::cursor::CURSOR_PARAM;
use crate::{PageFeedError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use std::time::Duration;
use tracing::debug;

/// Overall per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Page profile fields; the picture is capped at 200x200
pub const PAGE_INFO_FIELDS: &str =
    "id,name,picture.width(200).height(200){url},cover{source},fan_count";

/// Post fields; album fan-out is capped at 3 sub-attachments
pub const POST_FIELDS: &str = concat!(
    "id,message,story,created_time,permalink_url,full_picture,",
    "attachments{type,media_type,media{image{src,width,height}},target{url},title,description,",
    "subattachments.limit(3){type,media{image{src,width,height}},target{url}}},",
    "reactions.summary(total_count),comments.summary(total_count),shares"
);

/// Engagement-only re-fetch of a single post
pub const ENGAGEMENT_FIELDS: &str =
    "reactions.summary(total_count),comments.summary(total_count),shares";

/// Graph API client
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
}

impl GraphClient {
    /// Create a client for the given versioned base URL
    ///
    /// Returns an error if the HTTP client cannot be created or the base URL
    /// does not parse.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| {
            PageFeedError::Configuration(format!("Invalid Graph API base URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static(concat!("pagefeed/", env!("CARGO_PKG_VERSION"))),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Client for the public Graph API
    pub fn default_base() -> Result<Self> {
        Self::new(DEFAULT_API_BASE_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `{base}/{path}?{params}&access_token={token}`
    ///
    /// The second URL is the same request with the token redacted, for logs.
    fn build_url(&self, path: &str, access_token: &str, params: &[(&str, &str)]) -> Result<(Url, Url)> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .map_err(|e| PageFeedError::Configuration(format!("Invalid Graph API path '{}': {}", path, e)))?;
        url.query_pairs_mut().extend_pairs(params);

        let mut redacted = url.clone();
        redacted.query_pairs_mut().append_pair("access_token", "[redacted]");
        url.query_pairs_mut().append_pair("access_token", access_token);

        Ok((url, redacted))
    }

    /// Issue a GET and return the raw body of a successful response
    async fn get(&self, what: &str, path: &str, access_token: &str, params: &[(&str, &str)]) -> Result<String> {
        if access_token.trim().is_empty() {
            return Err(PageFeedError::Configuration(
                "Missing Facebook access token".to_string(),
            ));
        }

        let (url, redacted) = self.build_url(path, access_token, params)?;
        debug!(what, url = %redacted, "Graph API request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PageFeedError::Network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PageFeedError::Network(format!("{} body read failed: {}", what, e)))?;

        if !status.is_success() {
            return Err(wire::classify_failure(status.as_u16(), &body));
        }
        if let Some(error) = wire::error_in_body(status.as_u16(), &body) {
            return Err(error);
        }

        debug!(what, status = status.as_u16(), bytes = body.len(), "Graph API response");
        Ok(body)
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn fetch_page_info(&self, page_id: &str, access_token: &str) -> Result<PageInfo> {
        require_id("page id", page_id)?;
        let body = self
            .get("page info", page_id, access_token, &[("fields", PAGE_INFO_FIELDS)])
            .await?;
        let wire: PageInfoWire = wire::decode("page info", &body)?;
        Ok(wire.into())
    }

    async fn fetch_posts(
        &self,
        page_id: &str,
        access_token: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<PostsPage> {
        require_id("page id", page_id)?;
        let limit = limit.to_string();
        let mut params = vec![("fields", POST_FIELDS), ("limit", limit.as_str())];
        if let Some(cursor) = after {
            params.push((CURSOR_PARAM, cursor));
        }

        let body = self
            .get("posts", &format!("{}/posts", page_id), access_token, &params)
            .await?;
        let wire: PostsWire = wire::decode("posts", &body)?;
        PostsPage::try_from(wire)
    }

    async fn fetch_post_engagement(&self, post_id: &str, access_token: &str) -> Result<Engagement> {
        require_id("post id", post_id)?;
        let body = self
            .get("engagement", post_id, access_token, &[("fields", ENGAGEMENT_FIELDS)])
            .await?;
        let wire: EngagementWire = wire::decode("engagement", &body)?;
        Ok(wire.into())
    }
}

fn require_id(what: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(PageFeedError::Configuration(format!("Missing Facebook {}", what)));
    }
    Ok(())
}
