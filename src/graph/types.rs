//! Domain types returned by the Graph API access layer
//!
//! These are request-scoped snapshots. Nothing here is mutated after it is
//! returned; a later fetch of the same post yields an independent value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public profile of the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Graph `fan_count`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
}

/// Image descriptor attached to a post or attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentImage {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One attachment of a post
///
/// Albums carry their photos in `subattachments`, which are nested at most one
/// level deep: a sub-attachment never has sub-attachments of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Graph `type` (photo, album, share, video_inline, ...)
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<AttachmentImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subattachments: Vec<Attachment>,
}

impl Attachment {
    /// Images of this attachment followed by those of its sub-attachments
    pub fn images(&self) -> impl Iterator<Item = &AttachmentImage> {
        self.image
            .iter()
            .chain(self.subattachments.iter().filter_map(|s| s.image.as_ref()))
    }
}

/// One post published to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    pub created_time: DateTime<Utc>,
    pub permalink_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_count: Option<u64>,
}

impl Post {
    /// Text shown for the post: the message, else the story
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.story.as_deref())
    }
}

/// One page of posts plus the provider's pagination links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPage {
    pub posts: Vec<Post>,
    /// `after` cursor taken from `next_url`
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_url: Option<String>,
}

impl PostsPage {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Aggregate engagement counts of a single post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub reaction_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
}
