//! Graph API access layer
//!
//! Builds authenticated requests against the versioned Graph API base, decodes
//! responses into explicit schemas and maps provider error codes onto
//! [`PageFeedError`](crate::PageFeedError).
//!
//! # Error mapping
//!
//! | provider error                 | error                         |
//! |--------------------------------|-------------------------------|
//! | code 190, subcode 2069032      | `WrongTokenType`              |
//! | code 190, subcode 463          | `UpstreamAuth(Expired)`       |
//! | code 190                       | `UpstreamAuth(Invalid)`       |
//! | other `error` object           | `UpstreamApi { code, .. }`    |
//! | non-2xx without `error` object | `UpstreamStatus(status)`      |
//! | transport failure              | `Network`                     |
//! | body not matching the schema   | `Schema`                      |

mod client;
mod types;
mod wire;

pub use client::{GraphClient, ENGAGEMENT_FIELDS, PAGE_INFO_FIELDS, POST_FIELDS};
pub use types::{Attachment, AttachmentImage, Engagement, PageInfo, Post, PostsPage};
pub use wire::{CODE_OAUTH, SUBCODE_PAGE_TOKEN_REQUIRED, SUBCODE_TOKEN_EXPIRED};

use crate::Result;
use async_trait::async_trait;

/// The three reads the feed needs from the Graph API
///
/// [`GraphClient`] is the HTTP implementation; tests substitute their own.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Page name, picture, cover and follower count
    async fn fetch_page_info(&self, page_id: &str, access_token: &str) -> Result<PageInfo>;

    /// One page of posts; `after` is forwarded verbatim when present
    async fn fetch_posts(
        &self,
        page_id: &str,
        access_token: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<PostsPage>;

    /// Aggregate reaction, comment and share counts of one post
    async fn fetch_post_engagement(&self, post_id: &str, access_token: &str) -> Result<Engagement>;
}
