//! Graph API response schemas
//!
//! Bodies are decoded into these structs at the access-layer boundary and
//! converted into the domain types. Anything that does not fit is reported as
//! a schema error instead of leaking half-decoded data.

use super::types::{Attachment, AttachmentImage, Engagement, PageInfo, Post, PostsPage};
use crate::cursor::extract_next_cursor;
use crate::error::AuthFailure;
use crate::{PageFeedError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Token rejected (expired, revoked, wrong type)
pub const CODE_OAUTH: i64 = 190;
/// Subcode for an expired token
pub const SUBCODE_TOKEN_EXPIRED: i64 = 463;
/// Subcode for a user token used where a page token is required
pub const SUBCODE_PAGE_TOKEN_REQUIRED: i64 = 2069032;

#[derive(Debug, Deserialize)]
struct DataList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfoWire {
    id: String,
    name: String,
    #[serde(default)]
    picture: Option<PictureWire>,
    #[serde(default)]
    cover: Option<CoverWire>,
    #[serde(default)]
    fan_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PictureWire {
    data: PictureData,
}

#[derive(Debug, Deserialize)]
struct PictureData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CoverWire {
    source: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostsWire {
    data: Vec<PostWire>,
    #[serde(default)]
    paging: Option<PagingWire>,
}

#[derive(Debug, Deserialize)]
struct PagingWire {
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    previous: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostWire {
    id: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    story: Option<String>,
    created_time: String,
    permalink_url: String,
    #[serde(default)]
    full_picture: Option<String>,
    #[serde(default)]
    attachments: Option<DataList<AttachmentWire>>,
    #[serde(default)]
    reactions: Option<SummaryWire>,
    #[serde(default)]
    comments: Option<SummaryWire>,
    #[serde(default)]
    shares: Option<SharesWire>,
}

#[derive(Debug, Deserialize)]
struct AttachmentWire {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    media: Option<MediaWire>,
    #[serde(default)]
    target: Option<TargetWire>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    subattachments: Option<DataList<SubattachmentWire>>,
}

#[derive(Debug, Deserialize)]
struct SubattachmentWire {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    media: Option<MediaWire>,
    #[serde(default)]
    target: Option<TargetWire>,
}

#[derive(Debug, Deserialize)]
struct MediaWire {
    #[serde(default)]
    image: Option<ImageWire>,
}

#[derive(Debug, Deserialize)]
struct ImageWire {
    src: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TargetWire {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SummaryWire {
    #[serde(default)]
    summary: Option<TotalCount>,
}

#[derive(Debug, Deserialize)]
struct TotalCount {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct SharesWire {
    count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EngagementWire {
    #[serde(default)]
    reactions: Option<SummaryWire>,
    #[serde(default)]
    comments: Option<SummaryWire>,
    #[serde(default)]
    shares: Option<SharesWire>,
}

/// `{"error": {...}}` envelope returned on failure
#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorEnvelope {
    pub error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub code: i64,
    #[serde(default)]
    pub error_subcode: Option<i64>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

impl GraphErrorBody {
    /// Map a provider error to the crate's error taxonomy
    pub fn into_error(self) -> PageFeedError {
        match (self.code, self.error_subcode) {
            (CODE_OAUTH, Some(SUBCODE_PAGE_TOKEN_REQUIRED)) => PageFeedError::WrongTokenType,
            (CODE_OAUTH, Some(SUBCODE_TOKEN_EXPIRED)) => {
                PageFeedError::UpstreamAuth(AuthFailure::Expired)
            }
            (CODE_OAUTH, _) => PageFeedError::UpstreamAuth(AuthFailure::Invalid),
            (code, subcode) => PageFeedError::UpstreamApi {
                code,
                subcode,
                message: self.message,
            },
        }
    }
}

/// Classify an unsuccessful response body
pub(crate) fn classify_failure(status: u16, body: &str) -> PageFeedError {
    error_in_body(status, body).unwrap_or(PageFeedError::UpstreamStatus(status))
}

/// The provider error carried by `body`, if it holds an `error` object
///
/// Checked on successful responses too: the Graph API sometimes reports
/// errors with a 2xx status.
pub(crate) fn error_in_body(status: u16, body: &str) -> Option<PageFeedError> {
    let error = serde_json::from_str::<GraphErrorEnvelope>(body).ok()?.error;
    tracing::warn!(
        status,
        code = error.code,
        subcode = ?error.error_subcode,
        kind = error.kind.as_deref().unwrap_or("unknown"),
        fbtrace_id = error.fbtrace_id.as_deref().unwrap_or("-"),
        message = %error.message,
        "Graph API reported an error"
    );
    Some(error.into_error())
}

/// Decode a successful body, reporting mismatches as schema errors
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(what: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| PageFeedError::Schema(format!("{}: {}", what, e)))
}

/// Graph timestamps look like `2025-06-18T08:00:00+0000`
fn parse_graph_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PageFeedError::Schema(format!("created_time '{}': {}", raw, e)))
}

fn total(summary: Option<SummaryWire>) -> Option<u64> {
    summary.and_then(|s| s.summary).map(|t| t.total_count)
}

fn image(media: Option<MediaWire>) -> Option<AttachmentImage> {
    media.and_then(|m| m.image).map(|i| AttachmentImage {
        src: i.src,
        width: i.width,
        height: i.height,
    })
}

impl From<PageInfoWire> for PageInfo {
    fn from(wire: PageInfoWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            picture_url: wire.picture.map(|p| p.data.url),
            cover_url: wire.cover.map(|c| c.source),
            follower_count: wire.fan_count,
        }
    }
}

impl From<SubattachmentWire> for Attachment {
    fn from(wire: SubattachmentWire) -> Self {
        Self {
            kind: wire.kind,
            media_type: None,
            image: image(wire.media),
            target_url: wire.target.map(|t| t.url),
            title: None,
            description: None,
            subattachments: Vec::new(),
        }
    }
}

impl From<AttachmentWire> for Attachment {
    fn from(wire: AttachmentWire) -> Self {
        Self {
            kind: wire.kind,
            media_type: wire.media_type,
            image: image(wire.media),
            target_url: wire.target.map(|t| t.url),
            title: wire.title,
            description: wire.description,
            subattachments: wire
                .subattachments
                .map(|list| list.data.into_iter().map(Attachment::from).collect())
                .unwrap_or_default(),
        }
    }
}

impl TryFrom<PostWire> for Post {
    type Error = PageFeedError;

    fn try_from(wire: PostWire) -> Result<Self> {
        Ok(Self {
            created_time: parse_graph_time(&wire.created_time)?,
            id: wire.id,
            message: wire.message,
            story: wire.story,
            permalink_url: wire.permalink_url,
            full_picture: wire.full_picture,
            attachments: wire
                .attachments
                .map(|list| list.data.into_iter().map(Attachment::from).collect())
                .unwrap_or_default(),
            reaction_count: total(wire.reactions),
            comment_count: total(wire.comments),
            share_count: wire.shares.map(|s| s.count),
        })
    }
}

impl TryFrom<PostsWire> for PostsPage {
    type Error = PageFeedError;

    fn try_from(wire: PostsWire) -> Result<Self> {
        let posts = wire
            .data
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>>>()?;
        let (next_url, previous_url) = match wire.paging {
            Some(paging) => (paging.next, paging.previous),
            None => (None, None),
        };
        Ok(Self {
            posts,
            next_cursor: extract_next_cursor(next_url.as_deref()),
            next_url,
            previous_url,
        })
    }
}

impl From<EngagementWire> for Engagement {
    fn from(wire: EngagementWire) -> Self {
        Self {
            reaction_count: total(wire.reactions).unwrap_or(0),
            comment_count: total(wire.comments).unwrap_or(0),
            share_count: wire.shares.map(|s| s.count).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSTS_BODY: &str = r#"{
        "data": [
            {
                "id": "396720486865677_1",
                "message": "Check out this amazing single image post!",
                "created_time": "2025-06-18T08:00:00+0000",
                "permalink_url": "https://facebook.com/sample/posts/1",
                "full_picture": "https://scontent.xx.fbcdn.net/1.jpg",
                "reactions": {"data": [], "summary": {"total_count": 25}},
                "comments": {"data": [], "summary": {"total_count": 8}},
                "shares": {"count": 3}
            },
            {
                "id": "396720486865677_2",
                "story": "Sample Page added 2 new photos.",
                "created_time": "2025-06-18T06:00:00+0000",
                "permalink_url": "https://facebook.com/sample/posts/2",
                "attachments": {"data": [{
                    "type": "album",
                    "media_type": "album",
                    "target": {"url": "https://facebook.com/album/9"},
                    "subattachments": {"data": [
                        {"type": "photo", "media": {"image": {"src": "a.jpg", "width": 720, "height": 720}}},
                        {"type": "photo", "media": {"image": {"src": "b.jpg"}}}
                    ]}
                }]}
            }
        ],
        "paging": {
            "cursors": {"before": "B", "after": "A"},
            "next": "https://graph.facebook.com/v19.0/396720486865677/posts?limit=2&after=QVFI"
        }
    }"#;

    #[test]
    fn test_decode_posts_page() {
        let wire: PostsWire = decode("posts", POSTS_BODY).unwrap();
        let page = PostsPage::try_from(wire).unwrap();

        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("QVFI"));
        assert!(page.has_more());
        assert!(page.previous_url.is_none());

        let first = &page.posts[0];
        assert_eq!(first.reaction_count, Some(25));
        assert_eq!(first.comment_count, Some(8));
        assert_eq!(first.share_count, Some(3));
        assert_eq!(first.created_time.to_rfc3339(), "2025-06-18T08:00:00+00:00");

        let second = &page.posts[1];
        assert_eq!(second.reaction_count, None);
        let album = &second.attachments[0];
        assert_eq!(album.kind, "album");
        assert_eq!(album.target_url.as_deref(), Some("https://facebook.com/album/9"));
        assert_eq!(album.subattachments.len(), 2);
        assert_eq!(album.subattachments[1].image.as_ref().unwrap().width, None);
    }

    #[test]
    fn test_last_page_has_no_cursor() {
        let body = r#"{"data": [], "paging": {"previous": "https://graph.facebook.com/v19.0/1/posts?before=X"}}"#;
        let wire: PostsWire = decode("posts", body).unwrap();
        let page = PostsPage::try_from(wire).unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.next_cursor, None);
        assert!(page.previous_url.is_some());
    }

    #[test]
    fn test_schema_mismatch() {
        let missing_permalink = r#"{"data": [{"id": "1", "created_time": "2025-06-18T08:00:00+0000"}]}"#;
        let err = decode::<PostsWire>("posts", missing_permalink).unwrap_err();
        assert!(matches!(err, PageFeedError::Schema(_)));

        let bad_time = r#"{"data": [{"id": "1", "created_time": "yesterday", "permalink_url": "u"}]}"#;
        let wire: PostsWire = decode("posts", bad_time).unwrap();
        let err = PostsPage::try_from(wire).unwrap_err();
        assert!(matches!(err, PageFeedError::Schema(_)));
    }

    #[test]
    fn test_page_info_conversion() {
        let body = r#"{
            "id": "396720486865677",
            "name": "Sample Facebook Page",
            "picture": {"data": {"url": "https://scontent.xx.fbcdn.net/p.jpg"}},
            "cover": {"source": "https://scontent.xx.fbcdn.net/c.jpg", "id": "77"},
            "fan_count": 1250
        }"#;
        let info = PageInfo::from(decode::<PageInfoWire>("page info", body).unwrap());
        assert_eq!(info.name, "Sample Facebook Page");
        assert_eq!(info.picture_url.as_deref(), Some("https://scontent.xx.fbcdn.net/p.jpg"));
        assert_eq!(info.cover_url.as_deref(), Some("https://scontent.xx.fbcdn.net/c.jpg"));
        assert_eq!(info.follower_count, Some(1250));
    }

    #[test]
    fn test_engagement_defaults_to_zero() {
        let body = r#"{"id": "1_2", "reactions": {"data": [], "summary": {"total_count": 4}}}"#;
        let engagement = Engagement::from(decode::<EngagementWire>("engagement", body).unwrap());
        assert_eq!(
            engagement,
            Engagement {
                reaction_count: 4,
                comment_count: 0,
                share_count: 0
            }
        );
    }

    #[test]
    fn test_classify_oauth_subcodes() {
        let body = |subcode: &str| {
            format!(
                r#"{{"error": {{"message": "m", "type": "OAuthException", "code": 190{}, "fbtrace_id": "x"}}}}"#,
                subcode
            )
        };

        assert!(matches!(
            classify_failure(400, &body(r#", "error_subcode": 2069032"#)),
            PageFeedError::WrongTokenType
        ));
        assert!(matches!(
            classify_failure(400, &body(r#", "error_subcode": 463"#)),
            PageFeedError::UpstreamAuth(AuthFailure::Expired)
        ));
        assert!(matches!(
            classify_failure(400, &body("")),
            PageFeedError::UpstreamAuth(AuthFailure::Invalid)
        ));
    }

    #[test]
    fn test_classify_other_errors() {
        let body = r#"{"error": {"message": "(#100) Unknown fields", "type": "OAuthException", "code": 100}}"#;
        match classify_failure(400, body) {
            PageFeedError::UpstreamApi { code, message, .. } => {
                assert_eq!(code, 100);
                assert_eq!(message, "(#100) Unknown fields");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            classify_failure(403, "<html>Forbidden</html>"),
            PageFeedError::UpstreamStatus(403)
        ));
    }

    #[test]
    fn test_error_in_successful_body_any_layout() {
        let spaced = r#"{ "error" : { "message": "Session has expired", "code": 190, "error_subcode": 463 } }"#;
        assert!(matches!(
            error_in_body(200, spaced),
            Some(PageFeedError::UpstreamAuth(AuthFailure::Expired))
        ));

        let later_key = r#"{"id": "123", "error": {"message": "Unsupported get request", "code": 100}}"#;
        assert!(matches!(
            error_in_body(200, later_key),
            Some(PageFeedError::UpstreamApi { code: 100, .. })
        ));

        assert!(error_in_body(200, r#"{"id": "123", "name": "Page"}"#).is_none());
        assert!(error_in_body(200, r#"{"data": [], "message": "error"}"#).is_none());
    }
}
