//! In-memory Graph API double shared by the unit tests

use crate::cursor::extract_next_cursor;
use crate::error::AuthFailure;
use crate::graph::{Engagement, GraphApi, PageInfo, Post, PostsPage};
use crate::{PageFeedError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type ErrorHook = Box<dyn Fn(Option<&str>) -> Option<PageFeedError> + Send + Sync>;

/// Serves three pages of posts (cursors `c1`, `c2`) and counts every call
pub(crate) struct FakeGraph {
    pub page_info_calls: AtomicUsize,
    pub posts_calls: AtomicUsize,
    pub engagement_calls: AtomicUsize,
    pub posts_requests: Mutex<Vec<(u32, Option<String>)>>,
    page_info_error: Option<fn() -> PageFeedError>,
    posts_error: Option<ErrorHook>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self {
            page_info_calls: AtomicUsize::new(0),
            posts_calls: AtomicUsize::new(0),
            engagement_calls: AtomicUsize::new(0),
            posts_requests: Mutex::new(Vec::new()),
            page_info_error: None,
            posts_error: None,
        }
    }

    pub fn failing_page_info(mut self, error: fn() -> PageFeedError) -> Self {
        self.page_info_error = Some(error);
        self
    }

    /// Fail posts requests for which `hook` returns an error
    pub fn failing_posts<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&str>) -> Option<PageFeedError> + Send + Sync + 'static,
    {
        self.posts_error = Some(Box::new(hook));
        self
    }

    pub fn page_info_calls(&self) -> usize {
        self.page_info_calls.load(Ordering::SeqCst)
    }

    pub fn posts_calls(&self) -> usize {
        self.posts_calls.load(Ordering::SeqCst)
    }

    pub fn engagement_calls(&self) -> usize {
        self.engagement_calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn expired_token() -> PageFeedError {
    PageFeedError::UpstreamAuth(AuthFailure::Expired)
}

pub(crate) fn sample_page_info() -> PageInfo {
    PageInfo {
        id: "396720486865677".to_string(),
        name: "Sample Facebook Page".to_string(),
        picture_url: Some("https://scontent.xx.fbcdn.net/picture.jpg".to_string()),
        cover_url: Some("https://scontent.xx.fbcdn.net/cover.jpg".to_string()),
        follower_count: Some(1250),
    }
}

pub(crate) fn sample_post(id: &str) -> Post {
    Post {
        id: id.to_string(),
        message: Some(format!("Post {}", id)),
        story: None,
        created_time: "2025-06-18T08:00:00Z".parse().expect("valid timestamp"),
        permalink_url: format!("https://facebook.com/sample/posts/{}", id),
        full_picture: None,
        attachments: Vec::new(),
        reaction_count: Some(25),
        comment_count: Some(8),
        share_count: Some(3),
    }
}

#[async_trait]
impl GraphApi for FakeGraph {
    async fn fetch_page_info(&self, _page_id: &str, _access_token: &str) -> Result<PageInfo> {
        self.page_info_calls.fetch_add(1, Ordering::SeqCst);
        match self.page_info_error {
            Some(error) => Err(error()),
            None => Ok(sample_page_info()),
        }
    }

    async fn fetch_posts(
        &self,
        _page_id: &str,
        _access_token: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<PostsPage> {
        self.posts_calls.fetch_add(1, Ordering::SeqCst);
        self.posts_requests
            .lock()
            .expect("posts_requests lock")
            .push((limit, after.map(str::to_string)));

        if let Some(error) = self.posts_error.as_ref().and_then(|hook| hook(after)) {
            return Err(error);
        }

        let page: u32 = after
            .and_then(|c| c.strip_prefix('c'))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let posts = (0..limit.min(3))
            .map(|i| sample_post(&format!("{}_{}", page, i)))
            .collect();
        let next_url = (page < 2).then(|| {
            format!(
                "https://graph.facebook.com/v19.0/396720486865677/posts?limit={}&after=c{}",
                limit,
                page + 1
            )
        });

        Ok(PostsPage {
            posts,
            next_cursor: extract_next_cursor(next_url.as_deref()),
            next_url,
            previous_url: None,
        })
    }

    async fn fetch_post_engagement(&self, _post_id: &str, _access_token: &str) -> Result<Engagement> {
        let calls = self.engagement_calls.fetch_add(1, Ordering::SeqCst) as u64;
        Ok(Engagement {
            reaction_count: 25 + calls,
            comment_count: 8,
            share_count: 3,
        })
    }
}
